//! Time range resolver
//!
//! Computes the effective `[start, end)` window for a run from the sync
//! options and the previous run's cursor. Pure function of its inputs; the
//! caller supplies "today" so runs are reproducible and testable.

use crate::config::SyncOptions;
use crate::core::state::ExtractionState;
use crate::domain::errors::ExtractorError;
use crate::domain::result::Result;
use crate::domain::{DateWindow, CANONICAL_TIMESTAMP_FORMAT};
use chrono::NaiveDate;

/// Resolve the effective date window for this run
///
/// With `reload_full_data` the stored cursor is ignored and the window
/// starts at `date_from` (backfill). Otherwise the start is the later of
/// `date_from` and the cursor, so already-processed data is not re-fetched.
/// The end is `date_to` when configured, else `today`.
///
/// # Errors
///
/// Returns [`ExtractorError::InvalidRange`] when the effective start falls
/// after the effective end. An equal start and end is allowed and yields an
/// empty window.
pub fn resolve_window(
    options: &SyncOptions,
    state: Option<&ExtractionState>,
    today: NaiveDate,
) -> Result<DateWindow> {
    let date_from = options
        .date_from
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid");

    let start = if options.reload_full_data {
        date_from
    } else {
        match state {
            Some(state) => date_from.max(state.last_processed),
            None => date_from,
        }
    };

    let end = options
        .date_to
        .unwrap_or(today)
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid");

    if start > end {
        return Err(ExtractorError::InvalidRange {
            start: start.format(CANONICAL_TIMESTAMP_FORMAT).to_string(),
            end: end.format(CANONICAL_TIMESTAMP_FORMAT).to_string(),
        });
    }

    tracing::debug!(
        start = %start.format(CANONICAL_TIMESTAMP_FORMAT),
        end = %end.format(CANONICAL_TIMESTAMP_FORMAT),
        granularity = %options.granularity,
        reload_full_data = options.reload_full_data,
        "Resolved date window"
    );

    Ok(DateWindow::new(start, end, options.granularity))
}
