//! Error types for steward-render.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from config template rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (parse failure, missing template,
    /// undefined variable).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
