//! Parameterised platform detection tests for `steward-detect`.
//!
//! Each `#[case]` gets an isolated `TempDir` standing in for the host root.

use std::fs;

use rstest::rstest;
use steward_detect::{detect_platform, Confidence, DetectError, PlatformFamily};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_root() -> TempDir {
    TempDir::new().expect("tempdir")
}

fn write_etc(root: &TempDir, filename: &str, content: &str) {
    let etc = root.path().join("etc");
    fs::create_dir_all(&etc).expect("mkdir etc");
    fs::write(etc.join(filename), content).expect("write fixture");
}

// ---------------------------------------------------------------------------
// os-release ID matches
// ---------------------------------------------------------------------------

#[rstest]
#[case("debian", PlatformFamily::Debian)]
#[case("ubuntu", PlatformFamily::Debian)]
#[case("raspbian", PlatformFamily::Debian)]
#[case("rhel", PlatformFamily::Rhel)]
#[case("centos", PlatformFamily::Rhel)]
#[case("fedora", PlatformFamily::Rhel)]
#[case("rocky", PlatformFamily::Rhel)]
#[case("almalinux", PlatformFamily::Rhel)]
#[case("amzn", PlatformFamily::Rhel)]
fn direct_id_match(#[case] id: &str, #[case] family: PlatformFamily) {
    let root = make_root();
    write_etc(&root, "os-release", &format!("ID={id}\n"));
    let p = detect_platform(root.path()).expect("detect");
    assert_eq!(p.family, family);
    assert_eq!(p.id, id);
    assert_eq!(p.confidence, Confidence::High);
}

#[test]
fn id_is_case_insensitive_and_may_be_quoted() {
    let root = make_root();
    write_etc(&root, "os-release", "ID=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 22.04\"\n");
    let p = detect_platform(root.path()).expect("detect");
    assert_eq!(p.family, PlatformFamily::Debian);
    assert_eq!(p.pretty_name.as_deref(), Some("Ubuntu 22.04"));
}

// ---------------------------------------------------------------------------
// ID_LIKE fallback
// ---------------------------------------------------------------------------

#[rstest]
#[case("neon", "debian", PlatformFamily::Debian)]
#[case("eurolinux", "rhel fedora", PlatformFamily::Rhel)]
#[case("elementary", "ubuntu debian", PlatformFamily::Debian)]
fn id_like_match_is_medium_confidence(
    #[case] id: &str,
    #[case] id_like: &str,
    #[case] family: PlatformFamily,
) {
    let root = make_root();
    write_etc(
        &root,
        "os-release",
        &format!("ID={id}\nID_LIKE=\"{id_like}\"\n"),
    );
    let p = detect_platform(root.path()).expect("detect");
    assert_eq!(p.family, family);
    assert_eq!(p.id, id);
    assert_eq!(p.confidence, Confidence::Medium);
}

// ---------------------------------------------------------------------------
// Legacy release files
// ---------------------------------------------------------------------------

#[test]
fn debian_version_file_fallback() {
    let root = make_root();
    write_etc(&root, "debian_version", "12.4\n");
    let p = detect_platform(root.path()).expect("detect");
    assert_eq!(p.family, PlatformFamily::Debian);
    assert_eq!(p.confidence, Confidence::Medium);
}

#[test]
fn redhat_release_file_fallback() {
    let root = make_root();
    write_etc(&root, "redhat-release", "CentOS Linux release 7.9.2009 (Core)\n");
    let p = detect_platform(root.path()).expect("detect");
    assert_eq!(p.family, PlatformFamily::Rhel);
    assert_eq!(p.confidence, Confidence::Medium);
}

#[test]
fn os_release_takes_priority_over_legacy_files() {
    let root = make_root();
    write_etc(&root, "os-release", "ID=centos\n");
    write_etc(&root, "debian_version", "12.4\n");
    let p = detect_platform(root.path()).expect("detect");
    assert_eq!(p.family, PlatformFamily::Rhel);
    assert_eq!(p.confidence, Confidence::High);
}

// ---------------------------------------------------------------------------
// Unknown hosts
// ---------------------------------------------------------------------------

#[test]
fn empty_root_is_unknown() {
    let root = make_root();
    let err = detect_platform(root.path()).unwrap_err();
    assert!(matches!(err, DetectError::UnknownPlatform { .. }));
}

#[test]
fn unrecognised_distribution_is_unknown() {
    let root = make_root();
    write_etc(&root, "os-release", "ID=arch\nID_LIKE=\n");
    let err = detect_platform(root.path()).unwrap_err();
    assert!(matches!(err, DetectError::UnknownPlatform { .. }));
}
