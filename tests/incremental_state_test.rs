//! Integration tests for incremental state round-trips
//!
//! Exercises the resolver and state store together the way consecutive runs
//! use them: the cursor committed by one run becomes the start of the next.

use chrono::{NaiveDate, NaiveDateTime};
use energis_extractor::config::{Dataset, SyncOptions};
use energis_extractor::core::resolver::resolve_window;
use energis_extractor::core::state::{ExtractionState, FileStateStore, StateStore};
use energis_extractor::domain::Granularity;
use std::fs;
use tempfile::TempDir;

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn options(date_from: &str) -> SyncOptions {
    SyncOptions {
        dataset: Dataset::Xexport,
        nodes: vec![7090001],
        date_from: date_from.parse().unwrap(),
        date_to: None,
        granularity: Granularity::Day,
        reload_full_data: false,
    }
}

/// Feed one run's committed state into the next run's input slot
fn promote_state(dir: &TempDir) {
    let in_dir = dir.path().join("in");
    fs::create_dir_all(&in_dir).unwrap();
    fs::copy(
        dir.path().join("out/state.json"),
        in_dir.join("state.json"),
    )
    .unwrap();
}

#[test]
fn test_consecutive_runs_resume_from_cursor() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::new(dir.path());
    let today: NaiveDate = "2024-08-01".parse().unwrap();

    // First run: no prior state, window starts at date_from
    let state = store.load().unwrap();
    assert!(state.is_none());
    let window = resolve_window(&options("2024-01-01"), state.as_ref(), today).unwrap();
    assert_eq!(window.start, ts("2024-01-01T00:00:00"));
    assert_eq!(window.end, ts("2024-08-01T00:00:00"));

    // The run writes readings up to June 15 and commits that as the cursor
    store
        .commit(&ExtractionState::new(ts("2024-06-15T00:00:00")))
        .unwrap();
    promote_state(&dir);

    // Second run: resumes from the cursor, not from date_from
    let state = store.load().unwrap();
    let window = resolve_window(&options("2024-01-01"), state.as_ref(), today).unwrap();
    assert_eq!(window.start, ts("2024-06-15T00:00:00"));
    assert_eq!(window.end, ts("2024-08-01T00:00:00"));
}

#[test]
fn test_cursor_survives_canonical_format_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::new(dir.path());

    store
        .commit(&ExtractionState::new(ts("2024-06-15T08:15:00")))
        .unwrap();

    let contents = fs::read_to_string(dir.path().join("out/state.json")).unwrap();
    assert_eq!(contents, r#"{"last_processed":"2024-06-15T08:15:00"}"#);

    promote_state(&dir);
    let state = store.load().unwrap().unwrap();
    assert_eq!(state.last_processed, ts("2024-06-15T08:15:00"));
}

#[test]
fn test_corrupt_state_surfaces_as_corruption() {
    let dir = TempDir::new().unwrap();
    let in_dir = dir.path().join("in");
    fs::create_dir_all(&in_dir).unwrap();
    fs::write(in_dir.join("state.json"), "garbage").unwrap();

    let store = FileStateStore::new(dir.path());
    let err = store.load().unwrap_err();
    assert!(matches!(
        err,
        energis_extractor::domain::errors::ExtractorError::StateCorruption(_)
    ));

    // The run proceeds from date_from in that case; resolution still works
    let today: NaiveDate = "2024-08-01".parse().unwrap();
    let window = resolve_window(&options("2024-01-01"), None, today).unwrap();
    assert_eq!(window.start, ts("2024-01-01T00:00:00"));
}
