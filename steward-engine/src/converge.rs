//! The convergence engine.
//!
//! One run: load the first-run ledger, note whether the managed service was
//! already live, then walk the catalog in declaration order — guard, probe,
//! diff, apply, register notifications — and finish by flushing the
//! notification bus and rewriting the ledger. Forward-only: a fatal failure
//! aborts the remaining catalog but never rolls back applied changes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use steward_core::catalog::Catalog;
use steward_core::ledger::{self, Ledger, SeedState};
use steward_core::types::{
    ChangeDecision, Guard, NotifyAction, NotifyGate, Resource, ResourceKind, ResourceName,
    ResourceSpec, VarMap,
};

use crate::capability::Capabilities;
use crate::diff;
use crate::error::{ApplyError, ConvergeFailure, EngineError, GuardError};
use crate::notify::{FiredNotification, NotificationBus, NotificationEntry};
use crate::probe::{content_digest, ResourceProbe};

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Options for a convergence run.
#[derive(Debug, Clone, Default)]
pub struct ConvergeOptions {
    /// Report what would change without mutating anything: no applies, no
    /// fired notifications, no ledger write.
    pub dry_run: bool,
}

/// What happened to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Outcome {
    Applied,
    Unchanged,
    WouldApply,
    Skipped { reason: String },
    Failed { error: String },
}

/// One row of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    pub name: ResourceName,
    pub kind: ResourceKind,
    pub decision: ChangeDecision,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Ledger movement across the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerTransition {
    /// `None` when no record existed at run start (a true first run).
    pub before: Option<SeedState>,
    pub after: SeedState,
    /// False in dry-run: `after` is the value that would have been written.
    pub written: bool,
}

/// Full account of a convergence run, used by the CLI and tests.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ResourceOutcome>,
    pub notifications: Vec<FiredNotification>,
    pub ledger: LedgerTransition,
}

impl RunReport {
    /// Count of resources whose decision was not `NoOp`.
    pub fn changed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.decision.is_noop())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Guard evaluation
// ---------------------------------------------------------------------------

/// Evaluate an `only_if` guard. `Err` is the predicate itself failing;
/// callers demote that to false with a warning.
pub(crate) fn guard_passes(
    guard: &Guard,
    vars: &VarMap,
    caps: &Capabilities<'_>,
    ledger_present: bool,
) -> Result<bool, GuardError> {
    match guard {
        Guard::FileExists(path) => caps.fs.exists(path).map_err(|source| GuardError::Io {
            path: path.clone(),
            source,
        }),
        Guard::FileMissing(path) => caps
            .fs
            .exists(path)
            .map(|exists| !exists)
            .map_err(|source| GuardError::Io {
                path: path.clone(),
                source,
            }),
        Guard::VarContains { key, needle } => {
            let value = vars
                .get(key)
                .ok_or_else(|| GuardError::MissingVar { key: key.clone() })?;
            Ok(var_to_string(value).contains(needle.as_str()))
        }
        Guard::LedgerPresent(want) => Ok(ledger_present == *want),
        Guard::AllOf(guards) => {
            for inner in guards {
                if !guard_passes(inner, vars, caps, ledger_present)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn var_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Converge
// ---------------------------------------------------------------------------

/// Run one convergence pass of `catalog` against the host behind `caps`.
///
/// On a fatal failure the error carries the partial [`RunReport`] for
/// everything processed before the abort.
pub fn converge(
    catalog: &Catalog,
    caps: &Capabilities<'_>,
    opts: &ConvergeOptions,
) -> Result<RunReport, ConvergeFailure> {
    let started_at = Utc::now();
    let mut outcomes: Vec<ResourceOutcome> = Vec::new();

    let fail = |error: EngineError, outcomes: Vec<ResourceOutcome>, ledger: LedgerTransition| {
        ConvergeFailure {
            error,
            partial: RunReport {
                started_at,
                finished_at: Utc::now(),
                outcomes,
                notifications: Vec::new(),
                ledger,
            },
        }
    };

    let ledger_before = match ledger::load_at(&catalog.conf_dir) {
        Ok(l) => l,
        Err(e) => {
            return Err(fail(
                e.into(),
                outcomes,
                LedgerTransition {
                    before: None,
                    after: SeedState::Unseeded,
                    written: false,
                },
            ))
        }
    };
    let before_state = ledger_before.as_ref().map(Ledger::state);
    let unresolved = LedgerTransition {
        before: before_state,
        after: before_state.unwrap_or(SeedState::Unseeded),
        written: false,
    };

    // The seed heuristic: a service observed live before this run implies
    // an earlier run (or out-of-band seeding) already finished bootstrap.
    let service_was_running = probe_service_liveness(catalog, caps);

    let probe = ResourceProbe::new(caps);
    let mut bus = NotificationBus::new(caps.services, opts.dry_run);

    for resource in &catalog.resources {
        let name = resource.name();

        // Guard first; a skipped resource is probed by nothing and
        // notifies nothing.
        if let Some(guard) = &resource.only_if {
            match guard_passes(guard, &catalog.vars, caps, ledger_before.is_some()) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("skipped (guard): {name}");
                    outcomes.push(ResourceOutcome {
                        name,
                        kind: resource.kind(),
                        decision: ChangeDecision::NoOp,
                        outcome: Outcome::Skipped {
                            reason: "guard not satisfied".to_string(),
                        },
                    });
                    continue;
                }
                Err(err) => {
                    tracing::warn!("guard for '{name}' failed, treating as false: {err}");
                    outcomes.push(ResourceOutcome {
                        name,
                        kind: resource.kind(),
                        decision: ChangeDecision::NoOp,
                        outcome: Outcome::Skipped {
                            reason: format!("guard failed: {err}"),
                        },
                    });
                    continue;
                }
            }
        }

        // Desired content is rendered before the diff so the decision
        // compares what would actually land on disk.
        let rendered = match desired_content(catalog, resource, caps) {
            Ok(content) => content,
            Err(source) => {
                let error = EngineError::Render {
                    resource: name.clone(),
                    source,
                };
                if resource.best_effort {
                    tracing::warn!("best-effort resource failed: {error}");
                    outcomes.push(ResourceOutcome {
                        name,
                        kind: resource.kind(),
                        decision: ChangeDecision::NoOp,
                        outcome: Outcome::Failed {
                            error: error.to_string(),
                        },
                    });
                    continue;
                }
                outcomes.push(ResourceOutcome {
                    name,
                    kind: resource.kind(),
                    decision: ChangeDecision::NoOp,
                    outcome: Outcome::Failed {
                        error: error.to_string(),
                    },
                });
                return Err(fail(error, outcomes, unresolved.clone()));
            }
        };
        let rendered_digest = rendered.as_deref().map(content_digest);

        let probed = match probe.probe(resource) {
            Ok(p) => p,
            Err(e) => {
                outcomes.push(ResourceOutcome {
                    name,
                    kind: resource.kind(),
                    decision: ChangeDecision::NoOp,
                    outcome: Outcome::Failed {
                        error: e.to_string(),
                    },
                });
                return Err(fail(e.into(), outcomes, unresolved.clone()));
            }
        };

        let decision = diff::diff(&resource.spec, rendered_digest.as_deref(), &probed);
        if decision.is_noop() {
            tracing::debug!("unchanged: {name}");
            outcomes.push(ResourceOutcome {
                name,
                kind: resource.kind(),
                decision,
                outcome: Outcome::Unchanged,
            });
            continue;
        }

        if opts.dry_run {
            tracing::info!("[dry-run] would apply: {name} ({decision})");
            if let Err(e) = register_notifications(catalog, resource, &ledger_before, &mut bus) {
                outcomes.push(ResourceOutcome {
                    name,
                    kind: resource.kind(),
                    decision,
                    outcome: Outcome::Failed {
                        error: e.to_string(),
                    },
                });
                return Err(fail(e.into(), outcomes, unresolved.clone()));
            }
            outcomes.push(ResourceOutcome {
                name,
                kind: resource.kind(),
                decision,
                outcome: Outcome::WouldApply,
            });
            continue;
        }

        match apply(resource, &decision, rendered.as_deref(), caps) {
            Ok(()) => {
                tracing::info!("applied: {name} ({decision})");
                if let Err(e) = register_notifications(catalog, resource, &ledger_before, &mut bus)
                {
                    outcomes.push(ResourceOutcome {
                        name,
                        kind: resource.kind(),
                        decision,
                        outcome: Outcome::Failed {
                            error: e.to_string(),
                        },
                    });
                    return Err(fail(e.into(), outcomes, unresolved.clone()));
                }
                outcomes.push(ResourceOutcome {
                    name,
                    kind: resource.kind(),
                    decision,
                    outcome: Outcome::Applied,
                });
            }
            Err(e) => {
                if resource.best_effort {
                    tracing::warn!("best-effort resource failed: {e}");
                    outcomes.push(ResourceOutcome {
                        name,
                        kind: resource.kind(),
                        decision,
                        outcome: Outcome::Failed {
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
                outcomes.push(ResourceOutcome {
                    name,
                    kind: resource.kind(),
                    decision,
                    outcome: Outcome::Failed {
                        error: e.to_string(),
                    },
                });
                return Err(fail(e.into(), outcomes, unresolved.clone()));
            }
        }
    }

    let notifications = match bus.flush() {
        Ok(n) => n,
        Err(e) => return Err(fail(e.into(), outcomes, unresolved.clone())),
    };

    let final_ledger = ledger_before
        .unwrap_or_else(|| Ledger::new(false))
        .merge_observation(service_was_running);
    let written = !opts.dry_run;
    if written {
        if let Err(e) = ledger::save_at(&catalog.conf_dir, &final_ledger) {
            return Err(fail(e.into(), outcomes, unresolved.clone()));
        }
    }

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
        notifications,
        ledger: LedgerTransition {
            before: before_state,
            after: final_ledger.state(),
            written,
        },
    })
}

/// Whether any declared service is live before the run mutates anything.
///
/// A status failure here is logged and read as "not running": the seed
/// heuristic must not be able to abort an otherwise healthy run.
fn probe_service_liveness(catalog: &Catalog, caps: &Capabilities<'_>) -> bool {
    for resource in &catalog.resources {
        if let ResourceSpec::Service(svc) = &resource.spec {
            match caps.services.status(svc.unit_name()) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("service status probe for '{}' failed: {e}", svc.unit_name());
                }
            }
        }
    }
    false
}

/// Render the desired file body for content-bearing resources.
fn desired_content(
    catalog: &Catalog,
    resource: &Resource,
    caps: &Capabilities<'_>,
) -> Result<Option<String>, steward_render::RenderError> {
    match &resource.spec {
        ResourceSpec::Template(t) => {
            let mut vars = catalog.vars.clone();
            vars.extend(t.vars.clone());
            let rendered = caps.templates.render(&t.source, &vars)?;
            Ok(Some(rendered.replace("\r\n", "\n")))
        }
        ResourceSpec::File(f) => Ok(Some(f.content.replace("\r\n", "\n"))),
        _ => Ok(None),
    }
}

/// Resolve gates and enqueue a changed resource's declared notifications.
fn register_notifications(
    catalog: &Catalog,
    resource: &Resource,
    ledger_before: &Option<Ledger>,
    bus: &mut NotificationBus<'_>,
) -> Result<(), ApplyError> {
    for rule in &resource.notify {
        let action = match rule.gate {
            NotifyGate::Always => Some(rule.action),
            NotifyGate::LedgerPresent => ledger_before.is_some().then_some(rule.action),
            NotifyGate::SeedGated => match ledger_before {
                None => {
                    tracing::warn!(
                        "no action taken on '{}' notification — no first-run record yet",
                        resource.name()
                    );
                    None
                }
                Some(l) if !l.seeds.are_set => Some(NotifyAction::Restart),
                Some(_) => Some(NotifyAction::None),
            },
        };
        let Some(action) = action else {
            continue;
        };

        let unit = match catalog.resource(&rule.target).map(|r| &r.spec) {
            Some(ResourceSpec::Service(svc)) => svc.unit_name().to_string(),
            // Catalog validation guarantees service targets; fall back to
            // the bare name for hand-built catalogs.
            _ => rule
                .target
                .0
                .trim_start_matches("service:")
                .to_string(),
        };

        bus.register(NotificationEntry {
            target: rule.target.clone(),
            unit,
            action,
            timing: rule.timing,
        })?;
    }
    Ok(())
}

/// Apply one non-NoOp decision through the matching capability.
fn apply(
    resource: &Resource,
    decision: &ChangeDecision,
    rendered: Option<&str>,
    caps: &Capabilities<'_>,
) -> Result<(), ApplyError> {
    let creating = matches!(decision, ChangeDecision::Create);
    let result = match &resource.spec {
        ResourceSpec::User(s) => {
            if creating {
                caps.accounts.create_user(s)
            } else {
                caps.accounts.modify_user(s)
            }
        }
        ResourceSpec::Group(s) => {
            if creating {
                caps.accounts.create_group(s)
            } else {
                caps.accounts.modify_group(s)
            }
        }
        ResourceSpec::Directory(s) => {
            if creating {
                caps.fs.create_dir(
                    &s.path,
                    s.owner.as_deref(),
                    s.group.as_deref(),
                    s.mode,
                    s.recursive,
                )
            } else {
                caps.fs
                    .set_attrs(&s.path, s.owner.as_deref(), s.group.as_deref(), s.mode)
            }
        }
        ResourceSpec::Package(s) => {
            caps.packages
                .install(&s.name, s.pin().as_deref(), s.allow_downgrade)
        }
        ResourceSpec::Template(s) => write_managed_file(
            caps,
            &s.path,
            rendered,
            s.owner.as_deref(),
            s.group.as_deref(),
            s.mode,
        ),
        ResourceSpec::File(s) => write_managed_file(
            caps,
            &s.path,
            rendered,
            s.owner.as_deref(),
            s.group.as_deref(),
            s.mode,
        ),
        ResourceSpec::Link(s) => caps.fs.symlink(&s.target, &s.path),
        ResourceSpec::Service(s) => {
            let unit = s.unit_name();
            let needs = |field: &str| match decision {
                ChangeDecision::Update { fields } => fields.iter().any(|f| f.field == field),
                _ => true,
            };
            let mut result = Ok(());
            if s.enable && needs("enabled") {
                result = caps.services.enable(unit);
            }
            if result.is_ok() && s.start && needs("running") {
                result = caps.services.start(unit);
            }
            result
        }
    };

    result.map_err(|source| ApplyError {
        resource: resource.name(),
        source,
    })
}

fn write_managed_file(
    caps: &Capabilities<'_>,
    path: &std::path::Path,
    rendered: Option<&str>,
    owner: Option<&str>,
    group: Option<&str>,
    mode: Option<steward_core::types::Mode>,
) -> std::io::Result<()> {
    let content = rendered
        .ok_or_else(|| std::io::Error::other("no rendered content for managed file"))?;
    caps.fs.write(path, content, owner, group, mode)
}

// ---------------------------------------------------------------------------
// Tests — scenario coverage lives in tests/converge_scenarios.rs; these
// pin the pure pieces.
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(yaml: &str) -> VarMap {
        serde_yaml::from_str(yaml).expect("vars")
    }

    #[test]
    fn var_to_string_handles_scalars() {
        let vars = vars("uri: http://example.com/community\nport: 9042\n");
        assert_eq!(var_to_string(&vars["uri"]), "http://example.com/community");
        assert_eq!(var_to_string(&vars["port"]), "9042");
    }
}
