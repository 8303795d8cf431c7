//! Platform family detection for `steward-detect`.
//!
//! `detect_platform(root)` inspects indicator files under a host root and
//! returns the platform family that selects package-manager and
//! service-enable tooling. Checks are ordered by specificity: an
//! `/etc/os-release` `ID` match takes priority over `ID_LIKE`, which takes
//! priority over legacy release files.

use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Package-tooling family of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// apt/dpkg hosts (Debian, Ubuntu, and derivatives).
    Debian,
    /// yum/rpm hosts (RHEL, CentOS, Fedora, Amazon Linux, and derivatives).
    Rhel,
}

impl std::fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformFamily::Debian => f.write_str("debian"),
            PlatformFamily::Rhel => f.write_str("rhel"),
        }
    }
}

/// Confidence level of a detected platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// `os-release` `ID` named a known distribution directly.
    High,
    /// Inferred via `ID_LIKE` or a legacy release file.
    Medium,
}

/// A detected host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPlatform {
    pub family: PlatformFamily,
    /// Distribution identifier as reported by the host (e.g. `"ubuntu"`).
    pub id: String,
    /// Human-readable name from `PRETTY_NAME`, if present.
    pub pretty_name: Option<String>,
    pub confidence: Confidence,
}

/// Errors from platform detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine platform family for '{path}' — no known indicator file found")]
    UnknownPlatform { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

const DEBIAN_IDS: &[&str] = &["debian", "ubuntu", "linuxmint", "raspbian", "pop"];
const RHEL_IDS: &[&str] = &["rhel", "centos", "fedora", "rocky", "almalinux", "amzn", "ol"];

/// Detect the platform family of the host rooted at `root`.
///
/// `root` is `/` on a live host; tests point it at a fixture directory.
/// Returns `DetectError::UnknownPlatform` if no indicator matches.
pub fn detect_platform(root: &Path) -> Result<DetectedPlatform, DetectError> {
    if let Some(p) = detect_os_release(root)? {
        return Ok(p);
    }
    if let Some(p) = detect_legacy_release_files(root)? {
        return Ok(p);
    }
    Err(DetectError::UnknownPlatform {
        path: root.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Indicator checks
// ---------------------------------------------------------------------------

fn detect_os_release(root: &Path) -> Result<Option<DetectedPlatform>, DetectError> {
    let file = root.join("etc").join("os-release");
    if !file.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&file)?;

    let id = os_release_field(&content, "ID").unwrap_or_default();
    let id_like = os_release_field(&content, "ID_LIKE").unwrap_or_default();
    let pretty_name = os_release_field(&content, "PRETTY_NAME");

    if let Some(family) = family_for_id(&id) {
        return Ok(Some(DetectedPlatform {
            family,
            id,
            pretty_name,
            confidence: Confidence::High,
        }));
    }

    // ID_LIKE is a space-separated ancestry list ("rhel fedora").
    for like in id_like.split_whitespace() {
        if let Some(family) = family_for_id(like) {
            return Ok(Some(DetectedPlatform {
                family,
                id,
                pretty_name,
                confidence: Confidence::Medium,
            }));
        }
    }

    Ok(None)
}

fn detect_legacy_release_files(root: &Path) -> Result<Option<DetectedPlatform>, DetectError> {
    if root.join("etc").join("debian_version").exists() {
        return Ok(Some(DetectedPlatform {
            family: PlatformFamily::Debian,
            id: "debian".to_string(),
            pretty_name: None,
            confidence: Confidence::Medium,
        }));
    }
    if root.join("etc").join("redhat-release").exists() {
        return Ok(Some(DetectedPlatform {
            family: PlatformFamily::Rhel,
            id: "rhel".to_string(),
            pretty_name: None,
            confidence: Confidence::Medium,
        }));
    }
    Ok(None)
}

fn family_for_id(id: &str) -> Option<PlatformFamily> {
    let id = id.to_ascii_lowercase();
    if DEBIAN_IDS.contains(&id.as_str()) {
        return Some(PlatformFamily::Debian);
    }
    if RHEL_IDS.contains(&id.as_str()) {
        return Some(PlatformFamily::Rhel);
    }
    None
}

/// Extract a `KEY=value` field from os-release text, stripping quotes.
fn os_release_field(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.trim();
        let value = line.strip_prefix(key)?.strip_prefix('=')?;
        Some(value.trim_matches('"').trim_matches('\'').to_string())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_release_field_strips_quotes() {
        let content = "ID=ubuntu\nPRETTY_NAME=\"Ubuntu 22.04.3 LTS\"\n";
        assert_eq!(os_release_field(content, "ID").as_deref(), Some("ubuntu"));
        assert_eq!(
            os_release_field(content, "PRETTY_NAME").as_deref(),
            Some("Ubuntu 22.04.3 LTS")
        );
        assert_eq!(os_release_field(content, "ID_LIKE"), None);
    }

    #[test]
    fn id_prefix_does_not_shadow_id_like() {
        // "ID_LIKE=debian" must not satisfy a lookup for "ID".
        let content = "ID_LIKE=debian\nID=linuxmint\n";
        assert_eq!(os_release_field(content, "ID").as_deref(), Some("linuxmint"));
    }

    #[test]
    fn family_display() {
        assert_eq!(PlatformFamily::Debian.to_string(), "debian");
        assert_eq!(PlatformFamily::Rhel.to_string(), "rhel");
    }
}
