//! System user and group accounts.
//!
//! Probes parse `<root>/etc/passwd` and `<root>/etc/group` so they can run
//! against fixture trees; mutations shell out to the host's own account
//! tooling (useradd/usermod/groupadd/gpasswd), which is always host-global.

use std::io;
use std::path::{Path, PathBuf};

use steward_core::types::{GroupSpec, UserSpec};

use crate::capability::{AccountManager, GroupInfo, UserInfo};
use crate::system::{exec, passwd};

/// useradd/groupadd backed [`AccountManager`].
pub struct SystemAccountManager {
    root: PathBuf,
}

impl SystemAccountManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SystemAccountManager { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn user_args(spec: &UserSpec) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(comment) = &spec.comment {
        args.push("--comment".to_string());
        args.push(comment.clone());
    }
    if let Some(home) = &spec.home {
        args.push("--home-dir".to_string());
        args.push(home.display().to_string());
    }
    if let Some(shell) = &spec.shell {
        args.push("--shell".to_string());
        args.push(shell.clone());
    }
    args.push(spec.name.clone());
    args
}

fn run_with_string_args(program: &str, args: &[String]) -> io::Result<()> {
    let borrowed: Vec<&str> = args.iter().map(String::as_str).collect();
    exec::check(program, &borrowed)
}

impl AccountManager for SystemAccountManager {
    fn user_info(&self, name: &str) -> io::Result<Option<UserInfo>> {
        Ok(passwd::user_by_name(&self.root, name)?.map(|entry| UserInfo {
            comment: (!entry.gecos.is_empty()).then(|| entry.gecos.clone()),
            home: (!entry.home.is_empty()).then(|| PathBuf::from(&entry.home)),
            shell: (!entry.shell.is_empty()).then(|| entry.shell.clone()),
        }))
    }

    fn group_info(&self, name: &str) -> io::Result<Option<GroupInfo>> {
        Ok(passwd::group_by_name(&self.root, name)?.map(|entry| GroupInfo {
            members: entry.members,
        }))
    }

    fn create_user(&self, spec: &UserSpec) -> io::Result<()> {
        let mut args = vec!["--system".to_string()];
        args.extend(user_args(spec));
        run_with_string_args("useradd", &args)
    }

    fn modify_user(&self, spec: &UserSpec) -> io::Result<()> {
        run_with_string_args("usermod", &user_args(spec))
    }

    fn create_group(&self, spec: &GroupSpec) -> io::Result<()> {
        exec::check("groupadd", &["--system", &spec.name])?;
        if spec.members.is_empty() {
            return Ok(());
        }
        exec::check("gpasswd", &["-M", &spec.members.join(","), &spec.name])
    }

    fn modify_group(&self, spec: &GroupSpec) -> io::Result<()> {
        if spec.members.is_empty() {
            return Ok(());
        }
        exec::check("gpasswd", &["-M", &spec.members.join(","), &spec.name])
    }
}

// ---------------------------------------------------------------------------
// Tests — probe side only; mutations shell out to host tooling.
// ---------------------------------------------------------------------------
