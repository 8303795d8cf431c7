//! Declarative catalog document.
//!
//! A catalog is a YAML file listing resources in dependency order: the
//! author guarantees that directories precede the files that live in them,
//! users precede the directories they own, and packages precede the
//! services they provide. The engine never reorders.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::types::{Resource, ResourceKind, ResourceName, VarMap};

/// The catalog document version this build understands.
pub const CATALOG_VERSION: u32 = 1;

/// Root of a steward catalog YAML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u32,
    /// Render context for template resources and `var_contains` guards.
    #[serde(default)]
    pub vars: VarMap,
    /// Installation path the first-run ledger is keyed by.
    pub conf_dir: PathBuf,
    pub resources: Vec<Resource>,
}

impl Catalog {
    /// Parse and validate a catalog from YAML text.
    pub fn from_yaml(text: &str) -> Result<Catalog, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Look up a declared resource by identity.
    pub fn resource(&self, name: &ResourceName) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.name() == name)
    }

    /// Structural validation: version gate, unique identities, notify
    /// targets declared and service-kinded.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.version != CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: self.version,
                expected: CATALOG_VERSION,
            });
        }

        let mut seen = BTreeSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.name()) {
                return Err(CatalogError::DuplicateResource {
                    name: resource.name(),
                });
            }
        }

        for resource in &self.resources {
            for rule in &resource.notify {
                let Some(target) = self.resource(&rule.target) else {
                    return Err(CatalogError::UnknownNotifyTarget {
                        resource: resource.name(),
                        target: rule.target.clone(),
                    });
                };
                if target.kind() != ResourceKind::Service {
                    return Err(CatalogError::NotifyTargetNotService {
                        resource: resource.name(),
                        target: rule.target.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Load and validate the catalog at `path`.
///
/// Returns `CatalogError::NotFound` if absent,
/// `CatalogError::Parse` (with path + line context) if malformed YAML.
pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let catalog = Catalog::from_yaml(&contents).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    catalog.validate()?;
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
