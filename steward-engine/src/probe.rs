//! Read-only inspection of current host state.
//!
//! `probe()` never mutates and never fails for "resource absent" — absence
//! is itself a valid [`ProbedState`]. An `Err` always carries a real I/O
//! failure (permission denied, tooling missing, timeout).

use sha2::{Digest, Sha256};

use steward_core::types::{ProbedState, Resource, ResourceSpec};

use crate::capability::{Capabilities, FileKind};
use crate::error::ProbeError;

/// SHA-256 hex digest of content, CRLF-normalized so that line-ending
/// churn never reads as drift.
pub fn content_digest(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Probes one resource's real-world state through the capability seams.
pub struct ResourceProbe<'a> {
    caps: &'a Capabilities<'a>,
}

impl<'a> ResourceProbe<'a> {
    pub fn new(caps: &'a Capabilities<'a>) -> Self {
        ResourceProbe { caps }
    }

    /// Snapshot the current state of `resource`.
    pub fn probe(&self, resource: &Resource) -> Result<ProbedState, ProbeError> {
        self.probe_spec(&resource.spec)
            .map_err(|source| ProbeError {
                resource: resource.name(),
                source,
            })
    }

    fn probe_spec(&self, spec: &ResourceSpec) -> std::io::Result<ProbedState> {
        match spec {
            ResourceSpec::User(s) => Ok(match self.caps.accounts.user_info(&s.name)? {
                None => ProbedState::Absent,
                Some(info) => ProbedState::User {
                    comment: info.comment,
                    home: info.home,
                    shell: info.shell,
                },
            }),

            ResourceSpec::Group(s) => Ok(match self.caps.accounts.group_info(&s.name)? {
                None => ProbedState::Absent,
                Some(info) => ProbedState::Group {
                    members: info.members,
                },
            }),

            ResourceSpec::Directory(s) => Ok(match self.caps.fs.stat(&s.path)? {
                None => ProbedState::Absent,
                Some(stat) if stat.kind == FileKind::Directory => ProbedState::Directory {
                    owner: stat.owner,
                    group: stat.group,
                    mode: stat.mode,
                },
                Some(stat) => ProbedState::WrongKind {
                    found: stat.kind.to_string(),
                },
            }),

            ResourceSpec::Package(s) => Ok(match self.caps.packages.installed_version(&s.name)? {
                None => ProbedState::Absent,
                Some(version) => ProbedState::Package { version },
            }),

            ResourceSpec::Template(s) => self.probe_managed_file(&s.path),
            ResourceSpec::File(s) => self.probe_managed_file(&s.path),

            ResourceSpec::Link(s) => Ok(match self.caps.fs.stat(&s.path)? {
                None => ProbedState::Absent,
                Some(stat) if stat.kind == FileKind::Symlink => ProbedState::Link {
                    target: stat.link_target.unwrap_or_default(),
                },
                Some(stat) => ProbedState::WrongKind {
                    found: stat.kind.to_string(),
                },
            }),

            ResourceSpec::Service(s) => {
                let unit = s.unit_name();
                let running = self.caps.services.status(unit)?;
                let enabled = self.caps.services.enabled(unit)?;
                Ok(ProbedState::Service { enabled, running })
            }
        }
    }

    fn probe_managed_file(&self, path: &std::path::Path) -> std::io::Result<ProbedState> {
        let Some(stat) = self.caps.fs.stat(path)? else {
            return Ok(ProbedState::Absent);
        };
        if stat.kind != FileKind::File {
            return Ok(ProbedState::WrongKind {
                found: stat.kind.to_string(),
            });
        }
        // The file can vanish between stat and read; that is still absence.
        let Some(content) = self.caps.fs.read_all(path)? else {
            return Ok(ProbedState::Absent);
        };
        Ok(ProbedState::File {
            digest: content_digest(&content),
            owner: stat.owner,
            group: stat.group,
            mode: stat.mode,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let d = content_digest("hello\n");
        assert_eq!(d.len(), 64);
        assert_eq!(d, content_digest("hello\n"));
        assert_ne!(d, content_digest("hello!\n"));
    }

    #[test]
    fn crlf_and_lf_share_a_digest() {
        assert_eq!(
            content_digest("line1\r\nline2\r\n"),
            content_digest("line1\nline2\n")
        );
    }
}
