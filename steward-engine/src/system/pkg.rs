//! Platform package managers.
//!
//! Both implementations shell out to the platform's own tooling; steward
//! never manipulates package databases directly. Version queries report the
//! composite `version-release` string so pin comparisons match what the
//! repositories actually publish.

use std::io;
use std::process::Command;

use crate::capability::PackageManager;
use crate::system::exec;

// ---------------------------------------------------------------------------
// APT (Debian family)
// ---------------------------------------------------------------------------

/// dpkg/apt-get backed [`PackageManager`].
#[derive(Debug, Default)]
pub struct AptPackageManager;

impl AptPackageManager {
    pub fn new() -> Self {
        AptPackageManager
    }
}

impl PackageManager for AptPackageManager {
    fn installed_version(&self, name: &str) -> io::Result<Option<String>> {
        // Non-zero exit means "not installed"; a spawn failure propagates.
        let output = exec::run("dpkg-query", &["-W", "-f=${Version}", name])?;
        if !output.status.success() {
            return Ok(None);
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!version.is_empty()).then_some(version))
    }

    fn install(&self, name: &str, pin: Option<&str>, allow_downgrade: bool) -> io::Result<()> {
        let spec = match pin {
            Some(pin) => format!("{name}={pin}"),
            None => name.to_string(),
        };
        let mut cmd = Command::new("apt-get");
        cmd.env("DEBIAN_FRONTEND", "noninteractive")
            .arg("-y")
            .arg("install");
        if allow_downgrade {
            cmd.arg("--allow-downgrades");
        }
        cmd.arg(&spec);
        exec::check_cmd(&mut cmd)
    }
}

// ---------------------------------------------------------------------------
// YUM (RHEL family)
// ---------------------------------------------------------------------------

/// rpm/yum backed [`PackageManager`].
#[derive(Debug, Default)]
pub struct YumPackageManager;

impl YumPackageManager {
    pub fn new() -> Self {
        YumPackageManager
    }
}

impl PackageManager for YumPackageManager {
    fn installed_version(&self, name: &str) -> io::Result<Option<String>> {
        let output = exec::run(
            "rpm",
            &["-q", "--queryformat", "%{VERSION}-%{RELEASE}", name],
        )?;
        if !output.status.success() {
            return Ok(None);
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!version.is_empty()).then_some(version))
    }

    fn install(&self, name: &str, pin: Option<&str>, allow_downgrade: bool) -> io::Result<()> {
        let spec = match pin {
            Some(pin) => format!("{name}-{pin}"),
            None => name.to_string(),
        };
        match exec::check("yum", &["-y", "install", &spec]) {
            Ok(()) => Ok(()),
            // yum refuses to move to an older version-release via install;
            // a pinned older package needs an explicit downgrade.
            Err(_) if allow_downgrade && pin.is_some() => {
                exec::check("yum", &["-y", "downgrade", &spec])
            }
            Err(err) => Err(err),
        }
    }
}
