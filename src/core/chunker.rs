//! Request chunker
//!
//! Splits a resolved window into API-call-sized sub-windows. Chunk size is
//! derived from a response-size budget: finer granularities return more
//! points per day, so they get smaller spans. Sub-windows are half-open,
//! chronological, non-overlapping, and their union is exactly the input
//! window. The iterator is recomputable from the same window.

use crate::domain::{DateWindow, Granularity};
use chrono::Duration;

/// Response budget per call, in rows. Roughly 10 MB at ~200 bytes per row.
const MAX_ROWS_PER_CHUNK: u32 = 10 * 1024 * 1024 / 200;

/// Number of days one request may span for the given granularity and node
/// count. Never below one day. Coarse granularities produce one point per
/// node per day, so a single call covers decades and the whole window stays
/// one chunk in practice.
pub fn chunk_days(granularity: Granularity, node_count: usize) -> i64 {
    let rows_per_day = granularity.points_per_day() as u64 * node_count.max(1) as u64;
    (u64::from(MAX_ROWS_PER_CHUNK) / rows_per_day).max(1) as i64
}

/// Lazy chronological sequence of sub-windows covering `window`
pub fn chunks(window: DateWindow, node_count: usize) -> ChunkIter {
    let days = chunk_days(window.granularity, node_count);
    tracing::debug!(
        chunk_days = days,
        node_count,
        granularity = %window.granularity,
        span_days = window.span_days(),
        "Chunking date window"
    );
    ChunkIter {
        window,
        cursor: window.start,
        step: Duration::days(days),
    }
}

/// Iterator over half-open sub-windows of a [`DateWindow`]
pub struct ChunkIter {
    window: DateWindow,
    cursor: chrono::NaiveDateTime,
    step: Duration,
}

impl Iterator for ChunkIter {
    type Item = DateWindow;

    fn next(&mut self) -> Option<DateWindow> {
        if self.cursor >= self.window.end {
            return None;
        }
        let next = (self.cursor + self.step).min(self.window.end);
        let chunk = DateWindow::new(self.cursor, next, self.window.granularity);
        self.cursor = next;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn window(start: NaiveDateTime, end: NaiveDateTime, granularity: Granularity) -> DateWindow {
        DateWindow::new(start, end, granularity)
    }

    #[test]
    fn test_chunk_days_scales_with_granularity_and_nodes() {
        // minute data: 1440 rows/node/day, 52428-row budget
        assert_eq!(chunk_days(Granularity::Minute, 1), 36);
        assert_eq!(chunk_days(Granularity::Minute, 36), 1);
        // even thousands of nodes never push below one day
        assert_eq!(chunk_days(Granularity::Minute, 100_000), 1);
        // hourly: 24 rows/node/day
        assert_eq!(chunk_days(Granularity::Hour, 1), 2184);
        // daily and coarser: effectively unbounded spans
        assert!(chunk_days(Granularity::Day, 1) > 50_000);
        assert!(chunk_days(Granularity::Year, 10) > 5_000);
    }

    #[test]
    fn test_union_is_exact_and_non_overlapping() {
        let w = window(midnight(2024, 1, 1), midnight(2024, 3, 10), Granularity::Minute);
        let parts: Vec<DateWindow> = chunks(w, 4).collect();

        assert!(parts.len() > 1);
        assert_eq!(parts.first().unwrap().start, w.start);
        assert_eq!(parts.last().unwrap().end, w.end);
        for pair in parts.windows(2) {
            // Adjacent chunks share the boundary instant only as end/start
            // of half-open intervals, so no timestamp lands in both.
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn test_narrow_window_yields_single_chunk_equal_to_window() {
        let w = window(midnight(2024, 1, 1), midnight(2024, 1, 3), Granularity::Minute);
        let parts: Vec<DateWindow> = chunks(w, 1).collect();
        assert_eq!(parts, vec![w]);
    }

    #[test]
    fn test_yearly_window_is_one_call() {
        let w = window(midnight(2000, 1, 1), midnight(2024, 1, 1), Granularity::Year);
        let parts: Vec<DateWindow> = chunks(w, 3).collect();
        assert_eq!(parts, vec![w]);
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        let w = window(midnight(2024, 1, 1), midnight(2024, 1, 1), Granularity::Day);
        assert_eq!(chunks(w, 1).count(), 0);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let w = window(midnight(2024, 1, 1), midnight(2024, 2, 1), Granularity::QuarterHour);
        let first: Vec<DateWindow> = chunks(w, 40).collect();
        let second: Vec<DateWindow> = chunks(w, 40).collect();
        assert_eq!(first, second);
    }
}
