//! Unified-diff preview for `steward diff`.
//!
//! Renders what converge would write for content-bearing resources and
//! compares it to current on-disk content. Nothing is written.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use steward_core::catalog::Catalog;
use steward_core::ledger;
use steward_core::types::ResourceSpec;

use crate::capability::Capabilities;
use crate::error::EngineError;

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Render the desired content of every template/file resource and diff it
/// against what is currently on disk. Guard-skipped resources are omitted.
pub fn preview(catalog: &Catalog, caps: &Capabilities<'_>) -> Result<Vec<FileDiff>, EngineError> {
    let ledger_present = ledger::load_at(&catalog.conf_dir)?.is_some();
    let mut diffs = Vec::new();

    for resource in &catalog.resources {
        if !matches!(
            resource.spec,
            ResourceSpec::Template(_) | ResourceSpec::File(_)
        ) {
            continue;
        }

        if let Some(guard) = &resource.only_if {
            match crate::converge::guard_passes(guard, &catalog.vars, caps, ledger_present) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    tracing::warn!(
                        "guard for '{}' failed, omitting from diff: {err}",
                        resource.name()
                    );
                    continue;
                }
            }
        }

        let (path, rendered) = match &resource.spec {
            ResourceSpec::Template(t) => {
                let mut vars = catalog.vars.clone();
                vars.extend(t.vars.clone());
                let rendered = caps.templates.render(&t.source, &vars).map_err(|source| {
                    EngineError::Render {
                        resource: resource.name(),
                        source,
                    }
                })?;
                (t.path.clone(), normalize_line_endings(&rendered))
            }
            ResourceSpec::File(f) => (f.path.clone(), normalize_line_endings(&f.content)),
            _ => continue,
        };

        let existing = read_existing_or_empty(caps, &path)?;
        if existing == rendered {
            continue;
        }

        let relative = path.strip_prefix("/").unwrap_or(path.as_path());
        let old_header = format!("a/{}", relative.display());
        let new_header = format!("b/{}", relative.display());
        let unified = TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FileDiff {
            path,
            unified_diff: unified,
        });
    }

    Ok(diffs)
}

fn read_existing_or_empty(caps: &Capabilities<'_>, path: &Path) -> Result<String, EngineError> {
    match caps.fs.read_all(path) {
        Ok(Some(content)) => Ok(normalize_line_endings(&content)),
        Ok(None) => Ok(String::new()),
        Err(source) => Err(EngineError::Probe(crate::error::ProbeError {
            resource: steward_core::types::ResourceName(format!("file:{}", path.display())),
            source,
        })),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
