//! First-run ledger — persisted seed-state record keyed by installation path.
//!
//! A single JSON document at `<conf_dir>/first_run_complete.json`:
//!
//! ```json
//! { "seeds": { "are_set": false } }
//! ```
//!
//! Absence of the file is a valid state (a true first run), not an error.
//! Writes use the same atomic `.tmp` + rename pattern as the catalog store.
//! Once `are_set` is true it never reverts within a lineage of runs; the
//! engine enforces that through [`Ledger::merge_observation`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ledger_io_err, LedgerError};

/// File name of the ledger record inside the installation's conf dir.
pub const LEDGER_FILE: &str = "first_run_complete.json";

/// Derived two-state view of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedState {
    Unseeded,
    Seeded,
}

/// On-disk ledger payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub seeds: Seeds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeds {
    pub are_set: bool,
}

impl Ledger {
    pub fn new(are_set: bool) -> Self {
        Ledger {
            seeds: Seeds { are_set },
        }
    }

    pub fn state(&self) -> SeedState {
        if self.seeds.are_set {
            SeedState::Seeded
        } else {
            SeedState::Unseeded
        }
    }

    /// Fold a run's observation ("was the service already running before
    /// this run started") into the record. Monotonic: a seeded ledger stays
    /// seeded no matter what was observed.
    pub fn merge_observation(self, service_was_running: bool) -> Ledger {
        Ledger::new(self.seeds.are_set || service_was_running)
    }
}

/// `<conf_dir>/first_run_complete.json` — pure, no I/O.
pub fn path_at(conf_dir: &Path) -> PathBuf {
    conf_dir.join(LEDGER_FILE)
}

/// Load the ledger for an installation.
///
/// Returns `Ok(None)` when no record has ever been written.
pub fn load_at(conf_dir: &Path) -> Result<Option<Ledger>, LedgerError> {
    let path = path_at(conf_dir);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| ledger_io_err(&path, e))?;
    let ledger = serde_json::from_str(&contents).map_err(|e| LedgerError::Json {
        path: path.clone(),
        source: e,
    })?;
    Ok(Some(ledger))
}

/// Save the ledger atomically: write `<path>.tmp`, then rename.
pub fn save_at(conf_dir: &Path, ledger: &Ledger) -> Result<(), LedgerError> {
    let path = path_at(conf_dir);
    std::fs::create_dir_all(conf_dir).map_err(|e| ledger_io_err(conf_dir, e))?;

    let json = serde_json::to_string_pretty(ledger).map_err(|e| LedgerError::Json {
        path: path.clone(),
        source: e,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| ledger_io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| ledger_io_err(&path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_record_loads_as_none() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(load_at(tmp.path()).expect("load").is_none());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        save_at(tmp.path(), &Ledger::new(true)).expect("save");
        let loaded = load_at(tmp.path()).expect("load").expect("record");
        assert_eq!(loaded.state(), SeedState::Seeded);
    }

    #[test]
    fn wire_schema_matches_the_record_layout() {
        let json = serde_json::to_string(&Ledger::new(false)).expect("serialize");
        assert_eq!(json, r#"{"seeds":{"are_set":false}}"#);
        let parsed: Ledger = serde_json::from_str(r#"{ "seeds": { "are_set": true } }"#)
            .expect("parse");
        assert!(parsed.seeds.are_set);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().expect("tempdir");
        save_at(tmp.path(), &Ledger::new(false)).expect("save");
        let tmp_path = path_at(tmp.path()).with_extension("json.tmp");
        assert!(!tmp_path.exists(), ".tmp must be gone after atomic rename");
    }

    #[test]
    fn save_creates_conf_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let conf_dir = tmp.path().join("etc").join("cassandra");
        save_at(&conf_dir, &Ledger::new(false)).expect("save");
        assert!(path_at(&conf_dir).exists());
    }

    #[test]
    fn merge_observation_is_monotonic() {
        let seeded = Ledger::new(true);
        assert!(seeded.merge_observation(false).seeds.are_set);
        assert!(seeded.merge_observation(true).seeds.are_set);

        let unseeded = Ledger::new(false);
        assert!(!unseeded.merge_observation(false).seeds.are_set);
        assert!(unseeded.merge_observation(true).seeds.are_set);
    }

    #[test]
    fn malformed_record_is_a_json_error_with_path() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::write(path_at(tmp.path()), "not json").expect("write");
        let err = load_at(tmp.path()).unwrap_err();
        assert!(matches!(err, LedgerError::Json { .. }));
    }
}
