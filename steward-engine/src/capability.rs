//! Capability seams the engine drives.
//!
//! Package installation, filesystem mutation, account creation, service
//! control, and template rendering are collaborators behind object-safe
//! traits. The engine only ever talks to these; the system-backed
//! implementations live in [`crate::system`], and tests substitute fakes.
//!
//! All probe-side methods model absence as `Ok(None)` / `Ok(false)` —
//! an `Err` always means a real I/O failure.

use std::io;
use std::path::{Path, PathBuf};

use steward_core::types::{GroupSpec, Mode, UserSpec, VarMap};
use steward_render::{RenderError, Renderer};

// ---------------------------------------------------------------------------
// Probe payloads
// ---------------------------------------------------------------------------

/// What kind of filesystem object a path holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::File => f.write_str("file"),
            FileKind::Directory => f.write_str("directory"),
            FileKind::Symlink => f.write_str("symlink"),
            FileKind::Other => f.write_str("other"),
        }
    }
}

/// Stat snapshot of an existing path. `None` attribute values mean the
/// implementation could not determine them (e.g. a uid with no passwd entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub mode: Option<Mode>,
    /// Target of a symlink; `None` for other kinds.
    pub link_target: Option<PathBuf>,
}

/// Passwd-derived view of an existing user account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInfo {
    pub comment: Option<String>,
    pub home: Option<PathBuf>,
    pub shell: Option<String>,
}

/// Group-file-derived view of an existing group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupInfo {
    pub members: Vec<String>,
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Filesystem inspection and mutation.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read a file's full content. `Ok(None)` when the path does not exist.
    fn read_all(&self, path: &Path) -> io::Result<Option<String>>;

    /// Stat a path without following symlinks. `Ok(None)` when absent.
    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>>;

    /// Write content atomically and apply ownership/permissions.
    fn write(
        &self,
        path: &Path,
        content: &str,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
    ) -> io::Result<()>;

    /// Create a directory. With `recursive`, missing parents are created
    /// too; without it, a missing parent is an error.
    fn create_dir(
        &self,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
        recursive: bool,
    ) -> io::Result<()>;

    /// Re-apply ownership/permissions on an existing path.
    fn set_attrs(
        &self,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
    ) -> io::Result<()>;

    /// Create (or replace) a symlink at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;
}

/// Platform package tooling (APT-style or RPM-style).
pub trait PackageManager {
    /// Installed composite `version-release` string, `Ok(None)` when the
    /// package is not installed.
    fn installed_version(&self, name: &str) -> io::Result<Option<String>>;

    /// Install the package, optionally pinned to an exact version-release.
    fn install(&self, name: &str, pin: Option<&str>, allow_downgrade: bool) -> io::Result<()>;
}

/// Init-system service control.
pub trait ServiceControl {
    /// Whether the service is currently running.
    fn status(&self, name: &str) -> io::Result<bool>;

    /// Whether the service is enabled at boot; `Ok(None)` when the init
    /// system cannot answer.
    fn enabled(&self, name: &str) -> io::Result<Option<bool>>;

    fn enable(&self, name: &str) -> io::Result<()>;
    fn start(&self, name: &str) -> io::Result<()>;
    fn restart(&self, name: &str) -> io::Result<()>;
    fn reload(&self, name: &str) -> io::Result<()>;
}

/// System user and group accounts.
pub trait AccountManager {
    fn user_info(&self, name: &str) -> io::Result<Option<UserInfo>>;
    fn group_info(&self, name: &str) -> io::Result<Option<GroupInfo>>;

    fn create_user(&self, spec: &UserSpec) -> io::Result<()>;
    fn modify_user(&self, spec: &UserSpec) -> io::Result<()>;
    fn create_group(&self, spec: &GroupSpec) -> io::Result<()>;
    fn modify_group(&self, spec: &GroupSpec) -> io::Result<()>;
}

/// Template rendering seam.
pub trait TemplateSource {
    fn render(&self, source: &str, vars: &VarMap) -> Result<String, RenderError>;
}

impl TemplateSource for Renderer {
    fn render(&self, source: &str, vars: &VarMap) -> Result<String, RenderError> {
        Renderer::render(self, source, vars)
    }
}

// ---------------------------------------------------------------------------
// Capability bundle
// ---------------------------------------------------------------------------

/// Everything a convergence run needs to touch the outside world.
pub struct Capabilities<'a> {
    pub fs: &'a dyn FileSystem,
    pub packages: &'a dyn PackageManager,
    pub services: &'a dyn ServiceControl,
    pub accounts: &'a dyn AccountManager,
    pub templates: &'a dyn TemplateSource,
}
