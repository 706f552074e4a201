//! Extraction state tracking
//!
//! The single cross-run persistent entity: the timestamp of the last reading
//! actually written. The [`StateStore`] trait keeps the persistence mechanism
//! behind a load/commit boundary; the file-backed implementation follows the
//! platform data-folder contract (`in/state.json` read, `out/state.json`
//! written).

use crate::domain::errors::ExtractorError;
use crate::domain::result::Result;
use crate::domain::CANONICAL_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted incremental-fetch cursor
///
/// Holds the maximum timestamp among all readings written by the last
/// successful run. Created on first run, overwritten after each successful
/// run, never rolled back on partial failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionState {
    /// Last successfully processed timestamp, canonical format on disk
    #[serde(with = "canonical_timestamp")]
    pub last_processed: NaiveDateTime,
}

impl ExtractionState {
    pub fn new(last_processed: NaiveDateTime) -> Self {
        Self { last_processed }
    }
}

mod canonical_timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result2<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result2<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, CANONICAL_TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }

    type Result2<T, E> = std::result::Result<T, E>;
}

/// Load/commit boundary for the extraction cursor
pub trait StateStore {
    /// Load the previous state, or `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::StateCorruption`] when a state file exists
    /// but cannot be parsed. Callers fall back to the configured start date
    /// and surface a warning.
    fn load(&self) -> Result<Option<ExtractionState>>;

    /// Persist the new cursor for the next run.
    fn commit(&self, state: &ExtractionState) -> Result<()>;
}

/// File-backed state store following the data-folder contract
///
/// The prior state arrives at `<data>/in/state.json`; the new state is
/// written to `<data>/out/state.json` and picked up by the orchestration
/// layer after a successful run.
pub struct FileStateStore {
    in_path: PathBuf,
    out_path: PathBuf,
}

impl FileStateStore {
    /// Create a store rooted at the run's data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            in_path: data_dir.join("in").join("state.json"),
            out_path: data_dir.join("out").join("state.json"),
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<ExtractionState>> {
        if !self.in_path.exists() {
            tracing::debug!(path = %self.in_path.display(), "No prior state file, starting fresh");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.in_path)
            .map_err(|e| ExtractorError::State(format!("Failed to read state file: {e}")))?;

        // Platform delivers an empty object before the first successful run
        if contents.trim().is_empty() || contents.trim() == "{}" {
            return Ok(None);
        }

        let state: ExtractionState = serde_json::from_str(&contents).map_err(|e| {
            ExtractorError::StateCorruption(format!(
                "Unparseable state file {}: {e}",
                self.in_path.display()
            ))
        })?;

        Ok(Some(state))
    }

    fn commit(&self, state: &ExtractionState) -> Result<()> {
        if let Some(parent) = self.out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ExtractorError::State(format!("Failed to create state dir: {e}")))?;
        }

        let contents = serde_json::to_string(state)?;
        fs::write(&self.out_path, contents)
            .map_err(|e| ExtractorError::State(format!("Failed to write state file: {e}")))?;

        tracing::info!(
            last_processed = %state.last_processed.format(CANONICAL_TIMESTAMP_FORMAT),
            "Committed extraction state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_load_missing_state_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_empty_object_is_none() {
        let dir = TempDir::new().unwrap();
        let in_dir = dir.path().join("in");
        fs::create_dir_all(&in_dir).unwrap();
        fs::write(in_dir.join("state.json"), "{}").unwrap();

        let store = FileStateStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_commit_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path());
        let state = ExtractionState::new(ts(2024, 6, 15));

        store.commit(&state).unwrap();

        // The committed file is what the next run receives as input
        let out = dir.path().join("out").join("state.json");
        let in_dir = dir.path().join("in");
        fs::create_dir_all(&in_dir).unwrap();
        fs::copy(out, in_dir.join("state.json")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn test_state_serializes_canonical_format() {
        let state = ExtractionState::new(ts(2024, 6, 15));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"last_processed":"2024-06-15T00:00:00"}"#);
    }

    #[test]
    fn test_corrupt_state_is_distinct_error() {
        let dir = TempDir::new().unwrap();
        let in_dir = dir.path().join("in");
        fs::create_dir_all(&in_dir).unwrap();
        fs::write(in_dir.join("state.json"), r#"{"last_processed":"mid-June"}"#).unwrap();

        let store = FileStateStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, ExtractorError::StateCorruption(_)));
    }
}
