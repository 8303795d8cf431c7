//! Error taxonomy for convergence runs.
//!
//! Three failure classes with distinct propagation policies:
//! - [`ProbeError`] — I/O failure during read-only inspection; aborts the run.
//! - [`ApplyError`] — failure during a mutating operation; aborts the run
//!   unless the resource is marked best-effort.
//! - [`GuardError`] — a conditional predicate itself failed; demoted to
//!   guard-false with a warning, never fatal.

use std::path::PathBuf;

use thiserror::Error;

use steward_core::error::{CatalogError, LedgerError};
use steward_core::types::ResourceName;
use steward_render::RenderError;

use crate::converge::RunReport;

/// I/O failure during read-only inspection of a resource.
#[derive(Debug, Error)]
#[error("probe failed for '{resource}': {source}")]
pub struct ProbeError {
    pub resource: ResourceName,
    #[source]
    pub source: std::io::Error,
}

/// Failure during a mutating operation on a resource.
#[derive(Debug, Error)]
#[error("apply failed for '{resource}': {source}")]
pub struct ApplyError {
    pub resource: ResourceName,
    #[source]
    pub source: std::io::Error,
}

/// A guard predicate could not be evaluated.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("guard I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("guard references undeclared var '{key}'")]
    MissingVar { key: String },
}

/// All errors that can abort a convergence run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Template rendering failed while producing a resource's desired content.
    #[error("render error for '{resource}': {source}")]
    Render {
        resource: ResourceName,
        #[source]
        source: RenderError,
    },
}

/// A run that aborted midway: the fatal error plus everything that was
/// converged before it. Applied changes stay applied (forward-only).
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ConvergeFailure {
    pub error: EngineError,
    pub partial: RunReport,
}
