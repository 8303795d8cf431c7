//! System-backed capability implementations.
//!
//! [`host_capabilities`] wires the full bundle for a live host: a
//! root-relative filesystem, the platform family's package manager, timed
//! service control, account tooling, and the Tera renderer.

use std::path::Path;

use steward_detect::PlatformFamily;

pub mod accounts;
mod exec;
pub mod fs;
mod passwd;
pub mod pkg;
pub mod svc;

pub use accounts::SystemAccountManager;
pub use fs::SystemFileSystem;
pub use pkg::{AptPackageManager, YumPackageManager};
pub use svc::SystemServiceControl;

use crate::capability::{Capabilities, PackageManager};

/// Everything needed to build a [`Capabilities`] bundle for a live host.
///
/// Owns the concrete implementations; borrow them with
/// [`SystemCapabilities::as_capabilities`].
pub struct SystemCapabilities {
    fs: SystemFileSystem,
    packages: Box<dyn PackageManager>,
    services: SystemServiceControl,
    accounts: SystemAccountManager,
    renderer: steward_render::Renderer,
}

impl SystemCapabilities {
    pub fn new(
        root: &Path,
        family: PlatformFamily,
        renderer: steward_render::Renderer,
    ) -> Self {
        let packages: Box<dyn PackageManager> = match family {
            PlatformFamily::Debian => Box::new(AptPackageManager::new()),
            PlatformFamily::Rhel => Box::new(YumPackageManager::new()),
        };
        SystemCapabilities {
            fs: SystemFileSystem::new(root),
            packages,
            services: SystemServiceControl::new(family),
            accounts: SystemAccountManager::new(root),
            renderer,
        }
    }

    pub fn as_capabilities(&self) -> Capabilities<'_> {
        Capabilities {
            fs: &self.fs,
            packages: self.packages.as_ref(),
            services: &self.services,
            accounts: &self.accounts,
            templates: &self.renderer,
        }
    }
}
