//! # steward-engine
//!
//! The idempotent host-convergence core: probe current state, diff it
//! against the catalog's desired state, apply only what changed, and
//! coalesce service notifications into a single delayed flush.
//!
//! Call [`converge`] with a validated catalog and a [`Capabilities`]
//! bundle. The system-backed capability implementations live in
//! [`system`]; tests substitute fakes behind the same traits.

pub mod capability;
pub mod converge;
pub mod diff;
pub mod error;
pub mod notify;
pub mod preview;
pub mod probe;
pub mod system;

pub use capability::{
    AccountManager, Capabilities, FileKind, FileStat, FileSystem, GroupInfo, PackageManager,
    ServiceControl, TemplateSource, UserInfo,
};
pub use converge::{
    converge, ConvergeOptions, LedgerTransition, Outcome, ResourceOutcome, RunReport,
};
pub use error::{ApplyError, ConvergeFailure, EngineError, GuardError, ProbeError};
pub use notify::{FiredNotification, NotificationBus, NotificationEntry};
pub use preview::{preview, FileDiff};
pub use probe::{content_digest, ResourceProbe};
