//! Notification bus — delayed, deduplicated service actions.
//!
//! Entries for the same (target, timing) key coalesce by keeping the
//! strongest action (`none < reload < restart`). Delayed entries fire at
//! most once per run, in first-registration order, after every resource is
//! converged. Immediate entries fire synchronously at registration and are
//! never coalesced.

use steward_core::types::{NotifyAction, NotifyTiming, ResourceName};

use crate::capability::ServiceControl;
use crate::error::ApplyError;

/// A pending notification registered by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
    /// Identity of the target resource (`service:cassandra`).
    pub target: ResourceName,
    /// Init-system unit the action is invoked on.
    pub unit: String,
    pub action: NotifyAction,
    pub timing: NotifyTiming,
}

/// A notification that reached its target (or would have, in dry-run).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FiredNotification {
    pub target: ResourceName,
    pub action: NotifyAction,
    pub timing: NotifyTiming,
    /// False in dry-run: the action was reported, not invoked.
    pub fired: bool,
}

/// Coalescing action queue, flushed once at the end of a run.
pub struct NotificationBus<'a> {
    services: &'a dyn ServiceControl,
    dry_run: bool,
    delayed: Vec<NotificationEntry>,
    fired: Vec<FiredNotification>,
}

impl<'a> NotificationBus<'a> {
    pub fn new(services: &'a dyn ServiceControl, dry_run: bool) -> Self {
        NotificationBus {
            services,
            dry_run,
            delayed: Vec::new(),
            fired: Vec::new(),
        }
    }

    /// Register a notification. Delayed entries coalesce; immediate entries
    /// fire right here.
    pub fn register(&mut self, entry: NotificationEntry) -> Result<(), ApplyError> {
        match entry.timing {
            NotifyTiming::Delayed => {
                if let Some(existing) = self
                    .delayed
                    .iter_mut()
                    .find(|e| e.target == entry.target)
                {
                    let strongest = existing.action.max(entry.action);
                    if strongest != existing.action {
                        tracing::debug!(
                            "coalesced '{}' notification up to {strongest}",
                            entry.target
                        );
                    }
                    existing.action = strongest;
                } else {
                    self.delayed.push(entry);
                }
                Ok(())
            }
            NotifyTiming::Immediate => self.fire(entry),
        }
    }

    /// Fire every surviving delayed entry exactly once, in
    /// first-registration order, skipping entries that resolved to `none`.
    pub fn flush(&mut self) -> Result<Vec<FiredNotification>, ApplyError> {
        let pending: Vec<NotificationEntry> = self.delayed.drain(..).collect();
        for entry in pending {
            if entry.action == NotifyAction::None {
                tracing::debug!("notification for '{}' resolved to none", entry.target);
                continue;
            }
            self.fire(entry)?;
        }
        Ok(std::mem::take(&mut self.fired))
    }

    fn fire(&mut self, entry: NotificationEntry) -> Result<(), ApplyError> {
        if entry.action == NotifyAction::None {
            return Ok(());
        }

        if self.dry_run {
            tracing::info!(
                "[dry-run] would {} '{}'",
                entry.action,
                entry.unit
            );
            self.fired.push(FiredNotification {
                target: entry.target,
                action: entry.action,
                timing: entry.timing,
                fired: false,
            });
            return Ok(());
        }

        let result = match entry.action {
            NotifyAction::Reload => self.services.reload(&entry.unit),
            NotifyAction::Restart => self.services.restart(&entry.unit),
            NotifyAction::None => Ok(()),
        };
        result.map_err(|source| ApplyError {
            resource: entry.target.clone(),
            source,
        })?;

        tracing::info!("{}ed '{}'", entry.action, entry.unit);
        self.fired.push(FiredNotification {
            target: entry.target,
            action: entry.action,
            timing: entry.timing,
            fired: true,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
