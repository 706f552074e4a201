//! Run summary

use crate::domain::CANONICAL_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use std::time::Duration;

/// Outcome counters for one extraction run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Chunks the window was split into
    pub chunks_total: usize,
    /// Chunks fetched and written completely
    pub chunks_completed: usize,
    /// Normalized readings written to the output
    pub rows_written: u64,
    /// Malformed records skipped during normalization
    pub records_skipped: u64,
    /// Maximum timestamp among written readings, if any
    pub max_timestamp: Option<NaiveDateTime>,
    /// Wall-clock run duration
    pub duration: Duration,
}

impl RunSummary {
    /// Log the run outcome at info level
    pub fn log_summary(&self) {
        let max_timestamp = self
            .max_timestamp
            .map(|ts| ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string());
        tracing::info!(
            chunks_total = self.chunks_total,
            chunks_completed = self.chunks_completed,
            rows_written = self.rows_written,
            records_skipped = self.records_skipped,
            max_timestamp = max_timestamp.as_deref().unwrap_or("none"),
            duration_secs = self.duration.as_secs_f64(),
            "Extraction run complete"
        );
    }
}
