//! The differ — a pure function from (desired, probed) to a change decision.
//!
//! Policy:
//! - probed absent → `Create`
//! - present with every declared attribute matching → `NoOp`
//! - anything else → `Update` with a field-level diff
//!
//! Attributes the catalog leaves unspecified are not compared, and
//! attributes the probe could not determine (`None`) are not counted as
//! drift. Package pins compare the full `version-release` composite string.
//! Guard handling is the engine's job, not the differ's.

use steward_core::types::{ChangeDecision, FieldDiff, ProbedState, ResourceSpec};

/// Compare one resource's desired spec against its probed state.
///
/// `rendered_digest` carries the content digest of the desired file body
/// for template/file resources (the engine renders before diffing); it is
/// ignored for other kinds.
pub fn diff(
    spec: &ResourceSpec,
    rendered_digest: Option<&str>,
    probed: &ProbedState,
) -> ChangeDecision {
    if matches!(probed, ProbedState::Absent) {
        return ChangeDecision::Create;
    }
    if let ProbedState::WrongKind { found } = probed {
        return update(vec![field("kind", &spec.kind().to_string(), found)]);
    }

    let fields = match (spec, probed) {
        (ResourceSpec::User(s), ProbedState::User { comment, home, shell }) => {
            let mut fields = Vec::new();
            push_opt(&mut fields, "comment", s.comment.as_deref(), comment.as_deref());
            push_opt(
                &mut fields,
                "home",
                s.home.as_deref().map(|p| p.display().to_string()).as_deref(),
                home.as_deref().map(|p| p.display().to_string()).as_deref(),
            );
            push_opt(&mut fields, "shell", s.shell.as_deref(), shell.as_deref());
            fields
        }

        (ResourceSpec::Group(s), ProbedState::Group { members }) => {
            let mut fields = Vec::new();
            if !s.members.is_empty() {
                let mut desired = s.members.clone();
                let mut actual = members.clone();
                desired.sort();
                actual.sort();
                if desired != actual {
                    fields.push(field("members", &desired.join(","), &actual.join(",")));
                }
            }
            fields
        }

        (ResourceSpec::Directory(s), ProbedState::Directory { owner, group, mode }) => {
            let mut fields = Vec::new();
            push_opt(&mut fields, "owner", s.owner.as_deref(), owner.as_deref());
            push_opt(&mut fields, "group", s.group.as_deref(), group.as_deref());
            push_opt(
                &mut fields,
                "mode",
                s.mode.map(|m| m.to_string()).as_deref(),
                mode.map(|m| m.to_string()).as_deref(),
            );
            fields
        }

        (ResourceSpec::Package(s), ProbedState::Package { version }) => {
            let mut fields = Vec::new();
            if let Some(pin) = s.pin() {
                if &pin != version {
                    fields.push(field("version", &pin, version));
                }
            }
            fields
        }

        (
            ResourceSpec::Template(s),
            ProbedState::File { digest, owner, group, mode },
        ) => managed_file_fields(
            rendered_digest,
            digest,
            s.owner.as_deref(),
            s.group.as_deref(),
            s.mode,
            owner.as_deref(),
            group.as_deref(),
            *mode,
        ),

        (
            ResourceSpec::File(s),
            ProbedState::File { digest, owner, group, mode },
        ) => managed_file_fields(
            rendered_digest,
            digest,
            s.owner.as_deref(),
            s.group.as_deref(),
            s.mode,
            owner.as_deref(),
            group.as_deref(),
            *mode,
        ),

        (ResourceSpec::Link(s), ProbedState::Link { target }) => {
            if &s.target == target {
                Vec::new()
            } else {
                vec![field(
                    "target",
                    &s.target.display().to_string(),
                    &target.display().to_string(),
                )]
            }
        }

        (ResourceSpec::Service(s), ProbedState::Service { enabled, running }) => {
            let mut fields = Vec::new();
            if s.enable && *enabled == Some(false) {
                fields.push(field("enabled", "true", "false"));
            }
            if s.start && !*running {
                fields.push(field("running", "true", "false"));
            }
            fields
        }

        // A probe variant from a different kind means the snapshot cannot
        // be trusted; force a converging update.
        (spec, _) => vec![field("kind", &spec.kind().to_string(), "unknown")],
    };

    if fields.is_empty() {
        ChangeDecision::NoOp
    } else {
        update(fields)
    }
}

#[allow(clippy::too_many_arguments)]
fn managed_file_fields(
    desired_digest: Option<&str>,
    actual_digest: &str,
    desired_owner: Option<&str>,
    desired_group: Option<&str>,
    desired_mode: Option<steward_core::types::Mode>,
    actual_owner: Option<&str>,
    actual_group: Option<&str>,
    actual_mode: Option<steward_core::types::Mode>,
) -> Vec<FieldDiff> {
    let mut fields = Vec::new();
    if let Some(desired) = desired_digest {
        if desired != actual_digest {
            fields.push(field("content", desired, actual_digest));
        }
    }
    push_opt(&mut fields, "owner", desired_owner, actual_owner);
    push_opt(&mut fields, "group", desired_group, actual_group);
    push_opt(
        &mut fields,
        "mode",
        desired_mode.map(|m| m.to_string()).as_deref(),
        actual_mode.map(|m| m.to_string()).as_deref(),
    );
    fields
}

/// Compare a declared attribute against a probed one. Undeclared attributes
/// and undeterminable probes both opt out of the comparison.
fn push_opt(fields: &mut Vec<FieldDiff>, name: &str, desired: Option<&str>, actual: Option<&str>) {
    let (Some(desired), Some(actual)) = (desired, actual) else {
        return;
    };
    if desired != actual {
        fields.push(field(name, desired, actual));
    }
}

fn field(name: &str, desired: &str, actual: &str) -> FieldDiff {
    FieldDiff {
        field: name.to_string(),
        desired: desired.to_string(),
        actual: actual.to_string(),
    }
}

fn update(fields: Vec<FieldDiff>) -> ChangeDecision {
    ChangeDecision::Update { fields }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use steward_core::types::{
        DirectorySpec, LinkSpec, Mode, PackageSpec, ServiceSpec, UserSpec,
    };

    fn dir_spec(owner: Option<&str>, mode: Option<u32>) -> ResourceSpec {
        ResourceSpec::Directory(DirectorySpec {
            path: PathBuf::from("/var/lib/cassandra"),
            owner: owner.map(str::to_string),
            group: None,
            mode: mode.map(Mode),
            recursive: true,
        })
    }

    #[test]
    fn absent_is_create() {
        let decision = diff(&dir_spec(Some("cassandra"), None), None, &ProbedState::Absent);
        assert_eq!(decision, ChangeDecision::Create);
    }

    #[test]
    fn matching_directory_is_noop() {
        let probed = ProbedState::Directory {
            owner: Some("cassandra".to_string()),
            group: Some("cassandra".to_string()),
            mode: Some(Mode(0o755)),
        };
        let decision = diff(&dir_spec(Some("cassandra"), Some(0o755)), None, &probed);
        assert_eq!(decision, ChangeDecision::NoOp);
    }

    #[test]
    fn unspecified_attributes_are_not_compared() {
        let probed = ProbedState::Directory {
            owner: Some("root".to_string()),
            group: Some("root".to_string()),
            mode: Some(Mode(0o700)),
        };
        // No owner/group/mode declared → whatever is on disk is fine.
        let decision = diff(&dir_spec(None, None), None, &probed);
        assert_eq!(decision, ChangeDecision::NoOp);
    }

    #[test]
    fn owner_drift_is_a_field_update() {
        let probed = ProbedState::Directory {
            owner: Some("root".to_string()),
            group: None,
            mode: None,
        };
        match diff(&dir_spec(Some("cassandra"), None), None, &probed) {
            ChangeDecision::Update { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "owner");
                assert_eq!(fields[0].desired, "cassandra");
                assert_eq!(fields[0].actual, "root");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn undeterminable_probe_attribute_is_not_drift() {
        let probed = ProbedState::Directory {
            owner: None,
            group: None,
            mode: Some(Mode(0o755)),
        };
        let decision = diff(&dir_spec(Some("cassandra"), Some(0o755)), None, &probed);
        assert_eq!(decision, ChangeDecision::NoOp);
    }

    #[test]
    fn wrong_kind_forces_update() {
        let probed = ProbedState::WrongKind {
            found: "file".to_string(),
        };
        match diff(&dir_spec(None, None), None, &probed) {
            ChangeDecision::Update { fields } => assert_eq!(fields[0].field, "kind"),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn package_pin_compares_the_composite_string() {
        let spec = ResourceSpec::Package(PackageSpec {
            name: "dsc12".to_string(),
            version: Some("1.2.10".to_string()),
            release: Some("1".to_string()),
            allow_downgrade: true,
        });

        // Same upstream version, diverged release → drift.
        let probed = ProbedState::Package {
            version: "1.2.10-2".to_string(),
        };
        match diff(&spec, None, &probed) {
            ChangeDecision::Update { fields } => {
                assert_eq!(fields[0].field, "version");
                assert_eq!(fields[0].desired, "1.2.10-1");
                assert_eq!(fields[0].actual, "1.2.10-2");
            }
            other => panic!("expected update, got {other:?}"),
        }

        let exact = ProbedState::Package {
            version: "1.2.10-1".to_string(),
        };
        assert_eq!(diff(&spec, None, &exact), ChangeDecision::NoOp);
    }

    #[test]
    fn unpinned_installed_package_is_noop() {
        let spec = ResourceSpec::Package(PackageSpec {
            name: "python-cql".to_string(),
            version: None,
            release: None,
            allow_downgrade: false,
        });
        let probed = ProbedState::Package {
            version: "1.0.9-1".to_string(),
        };
        assert_eq!(diff(&spec, None, &probed), ChangeDecision::NoOp);
    }

    #[test]
    fn content_digest_mismatch_is_drift() {
        let spec = ResourceSpec::File(steward_core::types::FileSpec {
            path: PathBuf::from("/etc/x.conf"),
            content: "new".to_string(),
            owner: None,
            group: None,
            mode: None,
        });
        let probed = ProbedState::File {
            digest: "old-digest".to_string(),
            owner: None,
            group: None,
            mode: None,
        };
        match diff(&spec, Some("new-digest"), &probed) {
            ChangeDecision::Update { fields } => assert_eq!(fields[0].field, "content"),
            other => panic!("expected update, got {other:?}"),
        }

        let same = ProbedState::File {
            digest: "new-digest".to_string(),
            owner: None,
            group: None,
            mode: None,
        };
        assert_eq!(diff(&spec, Some("new-digest"), &same), ChangeDecision::NoOp);
    }

    #[test]
    fn link_target_compared_exactly() {
        let spec = ResourceSpec::Link(LinkSpec {
            path: PathBuf::from("/etc/init.d/cassandra"),
            target: PathBuf::from("/etc/init.d/dse"),
        });
        let good = ProbedState::Link {
            target: PathBuf::from("/etc/init.d/dse"),
        };
        assert_eq!(diff(&spec, None, &good), ChangeDecision::NoOp);

        let bad = ProbedState::Link {
            target: PathBuf::from("/etc/init.d/other"),
        };
        assert!(matches!(diff(&spec, None, &bad), ChangeDecision::Update { .. }));
    }

    #[test]
    fn stopped_service_needs_running() {
        let spec = ResourceSpec::Service(ServiceSpec {
            name: "cassandra".to_string(),
            service_name: None,
            enable: true,
            start: true,
        });
        let probed = ProbedState::Service {
            enabled: Some(true),
            running: false,
        };
        match diff(&spec, None, &probed) {
            ChangeDecision::Update { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "running");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn unknown_enablement_is_not_drift() {
        let spec = ResourceSpec::Service(ServiceSpec {
            name: "cassandra".to_string(),
            service_name: None,
            enable: true,
            start: true,
        });
        let probed = ProbedState::Service {
            enabled: None,
            running: true,
        };
        assert_eq!(diff(&spec, None, &probed), ChangeDecision::NoOp);
    }

    #[test]
    fn user_attribute_drift() {
        let spec = ResourceSpec::User(UserSpec {
            name: "cassandra".to_string(),
            comment: Some("Cassandra Server user".to_string()),
            home: Some(PathBuf::from("/usr/local/cassandra")),
            shell: Some("/bin/bash".to_string()),
        });
        let probed = ProbedState::User {
            comment: Some("Cassandra Server user".to_string()),
            home: Some(PathBuf::from("/home/cassandra")),
            shell: Some("/bin/bash".to_string()),
        };
        match diff(&spec, None, &probed) {
            ChangeDecision::Update { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "home");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }
}
