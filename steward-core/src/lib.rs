//! Steward core library — domain types, catalog parsing, first-run ledger.
//!
//! Public API surface:
//! - [`types`] — newtypes, resource specs, guards, notifications, decisions
//! - [`catalog`] — load / validate the declarative catalog document
//! - [`ledger`] — first-run ledger persistence and seed-state machine
//! - [`error`] — [`CatalogError`], [`LedgerError`]

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod types;

pub use catalog::Catalog;
pub use error::{CatalogError, LedgerError};
pub use ledger::{Ledger, SeedState};
pub use types::{
    ChangeDecision, FieldDiff, Guard, Mode, NotifyAction, NotifyGate, NotifyRule, NotifyTiming,
    ProbedState, Resource, ResourceKind, ResourceName, ResourceSpec, VarMap,
};
