//! Root-relative filesystem capability.
//!
//! All catalog paths are resolved against a host root (`/` on a live host,
//! a scratch directory under test), so the same catalog can converge
//! against either.
//!
//! ## Write protocol
//!
//! 1. Ensure the parent directory exists.
//! 2. Write content to `<path>.steward.tmp`.
//! 3. Apply mode and ownership to the tmp file.
//! 4. Rename to the final path (atomic on POSIX); remove the tmp on failure.
//!
//! Ownership changes need root; without it (or without a passwd entry for
//! the requested name) the chown is logged and skipped rather than failing
//! the run, so converges against scratch roots stay usable.

use std::io;
use std::path::{Path, PathBuf};

use steward_core::types::Mode;

use crate::capability::{FileKind, FileStat, FileSystem};
use crate::system::passwd;

/// [`FileSystem`] backed by `std::fs`, rooted at a host root.
pub struct SystemFileSystem {
    root: PathBuf,
}

impl SystemFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SystemFileSystem { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }

    fn apply_attrs(
        &self,
        resolved: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
    ) -> io::Result<()> {
        if let Some(mode) = mode {
            set_mode(resolved, mode)?;
        }
        if owner.is_some() || group.is_some() {
            self.chown_by_name(resolved, owner, group)?;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn chown_by_name(
        &self,
        resolved: &Path,
        owner: Option<&str>,
        group: Option<&str>,
    ) -> io::Result<()> {
        let uid = match owner {
            Some(name) => match passwd::user_by_name(&self.root, name)? {
                Some(entry) => Some(entry.uid),
                None => {
                    tracing::debug!("no passwd entry for '{name}', leaving owner unchanged");
                    None
                }
            },
            None => None,
        };
        let gid = match group {
            Some(name) => match passwd::group_by_name(&self.root, name)? {
                Some(entry) => Some(entry.gid),
                None => {
                    tracing::debug!("no group entry for '{name}', leaving group unchanged");
                    None
                }
            },
            None => None,
        };
        if uid.is_none() && gid.is_none() {
            return Ok(());
        }
        match std::os::unix::fs::chown(resolved, uid, gid) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                tracing::debug!(
                    "chown {} skipped (not running as root)",
                    resolved.display()
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(unix))]
    fn chown_by_name(
        &self,
        _resolved: &Path,
        _owner: Option<&str>,
        _group: Option<&str>,
    ) -> io::Result<()> {
        Ok(())
    }
}

impl FileSystem for SystemFileSystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::symlink_metadata(self.resolve(path)) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read_all(&self, path: &Path) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.resolve(path)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>> {
        let resolved = self.resolve(path);
        let meta = match std::fs::symlink_metadata(&resolved) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => Err(err)?,
        };

        let kind = if meta.file_type().is_symlink() {
            FileKind::Symlink
        } else if meta.is_dir() {
            FileKind::Directory
        } else if meta.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };

        let link_target = if kind == FileKind::Symlink {
            Some(std::fs::read_link(&resolved)?)
        } else {
            None
        };

        let (owner, group, mode) = stat_attrs(&self.root, &resolved, &meta)?;

        Ok(Some(FileStat {
            kind,
            owner,
            group,
            mode,
            link_target,
        }))
    }

    fn write(
        &self,
        path: &Path,
        content: &str,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
    ) -> io::Result<()> {
        let resolved = self.resolve(path);
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = PathBuf::from(format!("{}.steward.tmp", resolved.display()));
        std::fs::write(&tmp, content)?;
        if let Err(err) = self.apply_attrs(&tmp, owner, group, mode) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        if let Err(err) = std::fs::rename(&tmp, &resolved) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        Ok(())
    }

    fn create_dir(
        &self,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
        recursive: bool,
    ) -> io::Result<()> {
        let resolved = self.resolve(path);
        if recursive {
            std::fs::create_dir_all(&resolved)?;
        } else {
            std::fs::create_dir(&resolved)?;
        }
        self.apply_attrs(&resolved, owner, group, mode)
    }

    fn set_attrs(
        &self,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
    ) -> io::Result<()> {
        self.apply_attrs(&self.resolve(path), owner, group, mode)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let resolved = self.resolve(link);
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::symlink_metadata(&resolved) {
            Ok(_) => std::fs::remove_file(&resolved)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        make_symlink(target, &resolved)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: Mode) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode.0))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: Mode) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn stat_attrs(
    root: &Path,
    _resolved: &Path,
    meta: &std::fs::Metadata,
) -> io::Result<(Option<String>, Option<String>, Option<Mode>)> {
    use std::os::unix::fs::MetadataExt;
    let owner = passwd::user_name_for_uid(root, meta.uid())?;
    let group = passwd::group_name_for_gid(root, meta.gid())?;
    let mode = Some(Mode(meta.mode() & 0o7777));
    Ok((owner, group, mode))
}

#[cfg(not(unix))]
fn stat_attrs(
    _root: &Path,
    _resolved: &Path,
    _meta: &std::fs::Metadata,
) -> io::Result<(Option<String>, Option<String>, Option<Mode>)> {
    Ok((None, None, None))
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::other("symlinks are not supported on this platform"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
