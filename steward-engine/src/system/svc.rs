//! Init-system service control.
//!
//! Actions go through the `service` wrapper; boot enablement uses the
//! platform family's own tool (`update-rc.d` vs `chkconfig`). Every call is
//! wrapped in a bounded timeout so a hung service manager cannot stall a
//! convergence run indefinitely.

use std::io;
use std::time::Duration;

use steward_detect::PlatformFamily;

use crate::capability::ServiceControl;
use crate::system::exec;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `service`/`update-rc.d`/`chkconfig` backed [`ServiceControl`].
pub struct SystemServiceControl {
    family: PlatformFamily,
    timeout: Duration,
}

impl SystemServiceControl {
    pub fn new(family: PlatformFamily) -> Self {
        SystemServiceControl {
            family,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(family: PlatformFamily, timeout: Duration) -> Self {
        SystemServiceControl { family, timeout }
    }

    fn service_action(&self, name: &str, action: &str) -> io::Result<()> {
        let status = exec::status_with_timeout("service", &[name, action], self.timeout)?;
        if status.success() {
            return Ok(());
        }
        Err(io::Error::other(format!(
            "`service {name} {action}` exited with {status}"
        )))
    }
}

impl ServiceControl for SystemServiceControl {
    fn status(&self, name: &str) -> io::Result<bool> {
        // Exit 0 is "running", anything else is "not running"; only spawn
        // failures and timeouts are errors.
        let status = exec::status_with_timeout("service", &[name, "status"], self.timeout)?;
        Ok(status.success())
    }

    fn enabled(&self, _name: &str) -> io::Result<Option<bool>> {
        // SysV enablement has no portable query; report unknown rather
        // than guess, and let the differ treat unknown as non-drift.
        Ok(None)
    }

    fn enable(&self, name: &str) -> io::Result<()> {
        match self.family {
            PlatformFamily::Debian => exec::check("update-rc.d", &[name, "defaults"]),
            PlatformFamily::Rhel => exec::check("chkconfig", &[name, "on"]),
        }
    }

    fn start(&self, name: &str) -> io::Result<()> {
        self.service_action(name, "start")
    }

    fn restart(&self, name: &str) -> io::Result<()> {
        self.service_action(name, "restart")
    }

    fn reload(&self, name: &str) -> io::Result<()> {
        self.service_action(name, "reload")
    }
}
