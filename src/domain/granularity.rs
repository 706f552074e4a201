//! Time resolution of requested readings
//!
//! Each granularity carries the single-letter wire code the Energis API
//! expects and the number of data points one node produces per day, which
//! drives request chunk sizing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time resolution of requested readings, from yearly down to per-minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Granularity {
    Year,
    QuarterYear,
    Month,
    Day,
    Hour,
    QuarterHour,
    Minute,
}

impl Granularity {
    /// Single-letter code used in the `per` field of xexport requests
    pub fn short_code(self) -> &'static str {
        match self {
            Granularity::Year => "r",
            Granularity::QuarterYear => "v",
            Granularity::Month => "m",
            Granularity::Day => "d",
            Granularity::Hour => "h",
            Granularity::QuarterHour => "c",
            Granularity::Minute => "t",
        }
    }

    /// Data points per node per day at this resolution
    ///
    /// Coarser-than-daily granularities report at most one point per day
    /// within any given window, so they count as one.
    pub fn points_per_day(self) -> u32 {
        match self {
            Granularity::Minute => 24 * 60,
            Granularity::QuarterHour => 24 * 4,
            Granularity::Hour => 24,
            Granularity::Day
            | Granularity::Month
            | Granularity::QuarterYear
            | Granularity::Year => 1,
        }
    }

    /// Whether timestamps at this resolution carry a time-of-day component
    pub fn is_sub_daily(self) -> bool {
        matches!(
            self,
            Granularity::Hour | Granularity::QuarterHour | Granularity::Minute
        )
    }

    /// The camelCase name used in configuration and filenames
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Year => "year",
            Granularity::QuarterYear => "quarterYear",
            Granularity::Month => "month",
            Granularity::Day => "day",
            Granularity::Hour => "hour",
            Granularity::QuarterHour => "quarterHour",
            Granularity::Minute => "minute",
        }
    }

    /// Snake-cased form for output table names, e.g. `quarterHour` -> `quarter_hour`
    pub fn file_label(self) -> String {
        let mut out = String::new();
        for c in self.as_str().chars() {
            if c.is_ascii_uppercase() {
                out.push('_');
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
