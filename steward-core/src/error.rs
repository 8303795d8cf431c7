//! Error types for steward-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ResourceName;

/// All errors that can arise from loading and validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse catalog at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The catalog file did not exist at the expected path.
    #[error("catalog not found at {path}")]
    NotFound { path: PathBuf },

    /// The catalog document declares a version this build does not understand.
    #[error("unsupported catalog version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Two resources share one identity; declaration order would be ambiguous.
    #[error("duplicate resource '{name}'")]
    DuplicateResource { name: ResourceName },

    /// A notify rule names a target that is not declared in the catalog.
    #[error("resource '{resource}' notifies undeclared target '{target}'")]
    UnknownNotifyTarget {
        resource: ResourceName,
        target: ResourceName,
    },

    /// A notify rule targets a resource that is not a service.
    #[error("resource '{resource}' notifies non-service target '{target}'")]
    NotifyTargetNotService {
        resource: ResourceName,
        target: ResourceName,
    },
}

/// All errors that can arise from first-run ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("ledger JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience constructor for [`LedgerError::Io`].
pub(crate) fn ledger_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.into(),
        source,
    }
}
