//! Subcommand implementations and shared plumbing.

pub mod converge;
pub mod detect;
pub mod diff;
pub mod plan;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use steward_core::catalog::{self, Catalog};
use steward_detect::detect_platform;
use steward_engine::system::SystemCapabilities;
use steward_render::Renderer;

/// Rebase a catalog's host-absolute path under the selected root.
pub(crate) fn rebase(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

/// Load and validate the catalog, rebasing its `conf_dir` (the first-run
/// ledger key) under `root` so scratch-root runs stay self-contained.
pub(crate) fn load_catalog(path: &Path, root: &Path) -> Result<Catalog> {
    let mut catalog = catalog::load(path)
        .with_context(|| format!("failed to load catalog '{}'", path.display()))?;
    catalog.conf_dir = rebase(root, &catalog.conf_dir);
    Ok(catalog)
}

/// Build the system capability bundle for the selected root.
pub(crate) fn system_capabilities(
    root: &Path,
    template_dir: Option<&Path>,
) -> Result<SystemCapabilities> {
    let platform = detect_platform(root)
        .with_context(|| format!("platform detection failed under '{}'", root.display()))?;

    let renderer = match template_dir {
        Some(dir) => Renderer::with_template_dir(dir),
        None => Renderer::new(),
    }
    .context("failed to initialise the template renderer")?;

    Ok(SystemCapabilities::new(root, platform.family, renderer))
}
