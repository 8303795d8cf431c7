//! Domain types for the steward catalog.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Render variables carried by the catalog and handed to the template engine.
pub type VarMap = BTreeMap<String, serde_yaml::Value>;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed resource identity, rendered as `kind:name`
/// (e.g. `directory:/var/lib/cassandra`, `service:cassandra`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceName(pub String);

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// An octal permission mode, written as a string in catalog YAML (`"0644"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mode(pub u32);

impl TryFrom<String> for Mode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        u32::from_str_radix(s.trim_start_matches("0o"), 8)
            .map(Mode)
            .map_err(|_| format!("invalid octal mode '{s}'"))
    }
}

impl From<Mode> for String {
    fn from(m: Mode) -> Self {
        format!("{:04o}", m.0)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Resource kinds and specs
// ---------------------------------------------------------------------------

/// The category of a catalog resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    User,
    Group,
    Directory,
    Package,
    Template,
    File,
    Link,
    Service,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::User => "user",
            ResourceKind::Group => "group",
            ResourceKind::Directory => "directory",
            ResourceKind::Package => "package",
            ResourceKind::Template => "template",
            ResourceKind::File => "file",
            ResourceKind::Link => "link",
            ResourceKind::Service => "service",
        };
        f.write_str(s)
    }
}

/// A system user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

/// A system group and its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// A directory with ownership and permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySpec {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub recursive: bool,
}

/// An OS package, optionally pinned to an exact version-release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default)]
    pub allow_downgrade: bool,
}

impl PackageSpec {
    /// The composite `version-release` pin, when a version is declared.
    ///
    /// Release strings diverge between repositories even for identical
    /// upstream versions, so pinning always compares the full composite.
    pub fn pin(&self) -> Option<String> {
        let version = self.version.as_ref()?;
        Some(match &self.release {
            Some(release) => format!("{version}-{release}"),
            None => version.clone(),
        })
    }
}

/// A config file rendered from a named template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub path: PathBuf,
    /// Template name resolved by the rendering engine (e.g. `cassandra.yaml.tera`).
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// Per-resource variables layered over the catalog-level `vars`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: VarMap,
}

/// A file with literal content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

/// A symbolic link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub path: PathBuf,
    pub target: PathBuf,
}

/// A managed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    /// Init-system unit name when it differs from the resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_true")]
    pub start: bool,
}

impl ServiceSpec {
    pub fn unit_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(&self.name)
    }
}

fn default_true() -> bool {
    true
}

/// Desired attributes for one resource, tagged by kind in catalog YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSpec {
    User(UserSpec),
    Group(GroupSpec),
    Directory(DirectorySpec),
    Package(PackageSpec),
    Template(TemplateSpec),
    File(FileSpec),
    Link(LinkSpec),
    Service(ServiceSpec),
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::User(_) => ResourceKind::User,
            ResourceSpec::Group(_) => ResourceKind::Group,
            ResourceSpec::Directory(_) => ResourceKind::Directory,
            ResourceSpec::Package(_) => ResourceKind::Package,
            ResourceSpec::Template(_) => ResourceKind::Template,
            ResourceSpec::File(_) => ResourceKind::File,
            ResourceSpec::Link(_) => ResourceKind::Link,
            ResourceSpec::Service(_) => ResourceKind::Service,
        }
    }

    /// The identity string for this spec: `kind:name`.
    pub fn name(&self) -> ResourceName {
        let ident = match self {
            ResourceSpec::User(s) => s.name.clone(),
            ResourceSpec::Group(s) => s.name.clone(),
            ResourceSpec::Directory(s) => s.path.display().to_string(),
            ResourceSpec::Package(s) => s.name.clone(),
            ResourceSpec::Template(s) => s.path.display().to_string(),
            ResourceSpec::File(s) => s.path.display().to_string(),
            ResourceSpec::Link(s) => s.path.display().to_string(),
            ResourceSpec::Service(s) => s.name.clone(),
        };
        ResourceName(format!("{}:{}", self.kind(), ident))
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// An `only_if` predicate. A false guard skips the resource outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// Passes when the path exists on the host.
    FileExists(PathBuf),
    /// Passes when the path does not exist on the host.
    FileMissing(PathBuf),
    /// Passes when the catalog var `key` stringifies to something containing `needle`.
    VarContains { key: String, needle: String },
    /// Passes when a first-run ledger record exists at all (`true`) or is absent (`false`).
    LedgerPresent(bool),
    /// Passes when every inner guard passes.
    AllOf(Vec<Guard>),
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Action requested of a notification target. Ordering is strength:
/// `None < Reload < Restart`; coalescing keeps the strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum NotifyAction {
    #[default]
    None,
    Reload,
    Restart,
}

impl fmt::Display for NotifyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotifyAction::None => "none",
            NotifyAction::Reload => "reload",
            NotifyAction::Restart => "restart",
        };
        f.write_str(s)
    }
}

/// When a notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyTiming {
    /// Fires synchronously at registration; not coalesced.
    Immediate,
    /// Queued and fired once after all resources are converged.
    #[default]
    Delayed,
}

/// Ledger-state gate selecting whether (and how) a declared notification
/// is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyGate {
    /// Register the declared action unconditionally.
    #[default]
    Always,
    /// Register only when a ledger record exists at all.
    LedgerPresent,
    /// Primary-config policy: no ledger record suppresses the notification
    /// entirely (advisory logged); an unseeded record upgrades to a delayed
    /// restart; a seeded record registers no action.
    SeedGated,
}

/// A statically-declared "notify on change" rule attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRule {
    /// Target resource identity; must name a declared `service` resource.
    pub target: ResourceName,
    #[serde(default)]
    pub action: NotifyAction,
    #[serde(default)]
    pub timing: NotifyTiming,
    #[serde(default)]
    pub gate: NotifyGate,
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// One declarative catalog entry: desired attributes plus run policy.
/// Immutable during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(flatten)]
    pub spec: ResourceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_if: Option<Guard>,
    /// A failing apply on a best-effort resource is recorded and skipped
    /// instead of aborting the run.
    #[serde(default)]
    pub best_effort: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notify: Vec<NotifyRule>,
}

impl Resource {
    pub fn name(&self) -> ResourceName {
        self.spec.name()
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }
}

// ---------------------------------------------------------------------------
// Probed state
// ---------------------------------------------------------------------------

/// Snapshot of a resource's real-world attributes at probe time.
/// Created fresh each run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbedState {
    /// The resource does not exist on the host. A valid state, never an error.
    Absent,
    User {
        comment: Option<String>,
        home: Option<PathBuf>,
        shell: Option<String>,
    },
    Group {
        members: Vec<String>,
    },
    Directory {
        owner: Option<String>,
        group: Option<String>,
        mode: Option<Mode>,
    },
    /// Installed composite `version-release` string.
    Package {
        version: String,
    },
    File {
        digest: String,
        owner: Option<String>,
        group: Option<String>,
        mode: Option<Mode>,
    },
    Link {
        target: PathBuf,
    },
    /// Services always probe to a state; `enabled: None` means the init
    /// system's enablement could not be determined.
    Service {
        enabled: Option<bool>,
        running: bool,
    },
    /// The path exists but is not the kind the catalog declares
    /// (e.g. a regular file where a directory is expected).
    WrongKind {
        found: String,
    },
}

// ---------------------------------------------------------------------------
// Change decisions
// ---------------------------------------------------------------------------

/// One attribute-level mismatch between desired and probed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub desired: String,
    pub actual: String,
}

/// Outcome of diffing one resource. Derived per run, consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "decision")]
pub enum ChangeDecision {
    NoOp,
    Create,
    Update { fields: Vec<FieldDiff> },
}

impl ChangeDecision {
    pub fn is_noop(&self) -> bool {
        matches!(self, ChangeDecision::NoOp)
    }
}

impl fmt::Display for ChangeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeDecision::NoOp => f.write_str("no-op"),
            ChangeDecision::Create => f.write_str("create"),
            ChangeDecision::Update { fields } => {
                let names: Vec<&str> = fields.iter().map(|d| d.field.as_str()).collect();
                write!(f, "update ({})", names.join(", "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
