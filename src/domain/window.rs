//! Date window model
//!
//! A [`DateWindow`] is the half-open `[start, end)` range the resolver
//! produces and the chunker consumes. Never mutated after creation.

use crate::domain::Granularity;
use chrono::NaiveDateTime;

/// Half-open date/time range plus the granularity it was resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Inclusive start
    pub start: NaiveDateTime,
    /// Exclusive end
    pub end: NaiveDateTime,
    /// Granularity the window was resolved for
    pub granularity: Granularity,
}

impl DateWindow {
    /// Construct a window. Callers are responsible for `start <= end`;
    /// the resolver enforces it.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, granularity: Granularity) -> Self {
        Self {
            start,
            end,
            granularity,
        }
    }

    /// A `[x, x)` window covers nothing and produces no chunks
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Window span in whole days, rounding up partial days
    pub fn span_days(&self) -> i64 {
        let secs = (self.end - self.start).num_seconds();
        (secs + 86_399) / 86_400
    }
}
