//! In-memory capability fakes shared by the engine integration tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use steward_core::types::{GroupSpec, Mode, UserSpec};
use steward_engine::capability::{
    AccountManager, Capabilities, FileKind, FileStat, FileSystem, GroupInfo, PackageManager,
    ServiceControl, UserInfo,
};
use steward_render::Renderer;

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Node {
    File {
        content: String,
        owner: Option<String>,
        group: Option<String>,
        mode: Option<Mode>,
    },
    Dir {
        owner: Option<String>,
        group: Option<String>,
        mode: Option<Mode>,
    },
    Link {
        target: PathBuf,
    },
}

#[derive(Debug, Default)]
pub struct MemoryFs {
    pub nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

impl MemoryFs {
    pub fn seed_file(&self, path: &str, content: &str) {
        self.nodes.borrow_mut().insert(
            PathBuf::from(path),
            Node::File {
                content: content.to_string(),
                owner: None,
                group: None,
                mode: None,
            },
        );
    }

    pub fn content(&self, path: &str) -> Option<String> {
        match self.nodes.borrow().get(Path::new(path)) {
            Some(Node::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.nodes.borrow().contains_key(path))
    }

    fn read_all(&self, path: &Path) -> io::Result<Option<String>> {
        Ok(match self.nodes.borrow().get(path) {
            Some(Node::File { content, .. }) => Some(content.clone()),
            _ => None,
        })
    }

    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>> {
        Ok(self.nodes.borrow().get(path).map(|node| match node {
            Node::File { owner, group, mode, .. } => FileStat {
                kind: FileKind::File,
                owner: owner.clone(),
                group: group.clone(),
                mode: *mode,
                link_target: None,
            },
            Node::Dir { owner, group, mode } => FileStat {
                kind: FileKind::Directory,
                owner: owner.clone(),
                group: group.clone(),
                mode: *mode,
                link_target: None,
            },
            Node::Link { target } => FileStat {
                kind: FileKind::Symlink,
                owner: None,
                group: None,
                mode: None,
                link_target: Some(target.clone()),
            },
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
        self.nodes.borrow_mut().insert(
            path.to_path_buf(),
            Node::File {
                content: content.to_string(),
                owner: owner.map(str::to_string),
                group: group.map(str::to_string),
                mode,
            },
        );
        Ok(())
    }

    fn create_dir(
        &self,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
        _recursive: bool,
    ) -> io::Result<()> {
        self.nodes.borrow_mut().insert(
            path.to_path_buf(),
            Node::Dir {
                owner: owner.map(str::to_string),
                group: group.map(str::to_string),
                mode,
            },
        );
        Ok(())
    }

    fn set_attrs(
        &self,
        path: &Path,
        owner: Option<&str>,
        group: Option<&str>,
        mode: Option<Mode>,
    ) -> io::Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let Some(node) = nodes.get_mut(path) else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such node"));
        };
        match node {
            Node::File { owner: o, group: g, mode: m, .. }
            | Node::Dir { owner: o, group: g, mode: m } => {
                if owner.is_some() {
                    *o = owner.map(str::to_string);
                }
                if group.is_some() {
                    *g = group.map(str::to_string);
                }
                if mode.is_some() {
                    *m = mode;
                }
            }
            Node::Link { .. } => {}
        }
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        self.nodes.borrow_mut().insert(
            link.to_path_buf(),
            Node::Link {
                target: target.to_path_buf(),
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakePackages {
    pub installed: RefCell<BTreeMap<String, String>>,
    pub fail_install: Cell<bool>,
    pub installs: RefCell<Vec<String>>,
}

impl PackageManager for FakePackages {
    fn installed_version(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.installed.borrow().get(name).cloned())
    }

    fn install(&self, name: &str, pin: Option<&str>, _allow_downgrade: bool) -> io::Result<()> {
        if self.fail_install.get() {
            return Err(io::Error::other("repository unreachable"));
        }
        let version = pin.unwrap_or("1.0-1").to_string();
        self.installs.borrow_mut().push(name.to_string());
        self.installed.borrow_mut().insert(name.to_string(), version);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeServices {
    pub running: RefCell<BTreeMap<String, bool>>,
    pub enabled: RefCell<BTreeMap<String, bool>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeServices {
    pub fn set_running(&self, name: &str, running: bool) {
        self.running.borrow_mut().insert(name.to_string(), running);
    }

    pub fn set_enabled(&self, name: &str, enabled: bool) {
        self.enabled.borrow_mut().insert(name.to_string(), enabled);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ServiceControl for FakeServices {
    fn status(&self, name: &str) -> io::Result<bool> {
        Ok(self.running.borrow().get(name).copied().unwrap_or(false))
    }

    fn enabled(&self, name: &str) -> io::Result<Option<bool>> {
        Ok(self.enabled.borrow().get(name).copied())
    }

    fn enable(&self, name: &str) -> io::Result<()> {
        self.calls.borrow_mut().push(format!("enable {name}"));
        self.enabled.borrow_mut().insert(name.to_string(), true);
        Ok(())
    }

    fn start(&self, name: &str) -> io::Result<()> {
        self.calls.borrow_mut().push(format!("start {name}"));
        self.running.borrow_mut().insert(name.to_string(), true);
        Ok(())
    }

    fn restart(&self, name: &str) -> io::Result<()> {
        self.calls.borrow_mut().push(format!("restart {name}"));
        self.running.borrow_mut().insert(name.to_string(), true);
        Ok(())
    }

    fn reload(&self, name: &str) -> io::Result<()> {
        self.calls.borrow_mut().push(format!("reload {name}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeAccounts {
    pub users: RefCell<BTreeMap<String, UserInfo>>,
    pub groups: RefCell<BTreeMap<String, GroupInfo>>,
}

impl FakeAccounts {
    fn store_user(&self, spec: &UserSpec) {
        self.users.borrow_mut().insert(
            spec.name.clone(),
            UserInfo {
                comment: spec.comment.clone(),
                home: spec.home.clone(),
                shell: spec.shell.clone(),
            },
        );
    }

    fn store_group(&self, spec: &GroupSpec) {
        self.groups.borrow_mut().insert(
            spec.name.clone(),
            GroupInfo {
                members: spec.members.clone(),
            },
        );
    }
}

impl AccountManager for FakeAccounts {
    fn user_info(&self, name: &str) -> io::Result<Option<UserInfo>> {
        Ok(self.users.borrow().get(name).cloned())
    }

    fn group_info(&self, name: &str) -> io::Result<Option<GroupInfo>> {
        Ok(self.groups.borrow().get(name).cloned())
    }

    fn create_user(&self, spec: &UserSpec) -> io::Result<()> {
        self.store_user(spec);
        Ok(())
    }

    fn modify_user(&self, spec: &UserSpec) -> io::Result<()> {
        self.store_user(spec);
        Ok(())
    }

    fn create_group(&self, spec: &GroupSpec) -> io::Result<()> {
        self.store_group(spec);
        Ok(())
    }

    fn modify_group(&self, spec: &GroupSpec) -> io::Result<()> {
        self.store_group(spec);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host bundle
// ---------------------------------------------------------------------------

/// A complete fake host: in-memory filesystem, package set, init system,
/// account database, plus the real Tera renderer.
pub struct TestHost {
    pub fs: MemoryFs,
    pub packages: FakePackages,
    pub services: FakeServices,
    pub accounts: FakeAccounts,
    pub renderer: Renderer,
}

impl TestHost {
    pub fn new() -> Self {
        TestHost {
            fs: MemoryFs::default(),
            packages: FakePackages::default(),
            services: FakeServices::default(),
            accounts: FakeAccounts::default(),
            renderer: Renderer::new().expect("embedded templates"),
        }
    }

    pub fn caps(&self) -> Capabilities<'_> {
        Capabilities {
            fs: &self.fs,
            packages: &self.packages,
            services: &self.services,
            accounts: &self.accounts,
            templates: &self.renderer,
        }
    }
}
