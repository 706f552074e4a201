//! Record normalizer
//!
//! Converts raw xexport records into canonical [`Reading`]s. The service
//! formats the `cas` timestamp differently per granularity, so parsing is a
//! tagged dispatch on granularity rather than format sniffing. Failures are
//! per-record: the caller skips and counts them.
//!
//! Source formats observed from the service:
//! - year: `2024`
//! - quarterYear: `II/2024` (roman quarter numeral)
//! - month: `06/2024`
//! - day: `15.06.2024` (ISO `2024-06-15` also accepted)
//! - hour/quarterHour/minute: `15.06.2024 08-09` or `15.06.2024 08:15`,
//!   where a range collapses to its start
//!
//! All of these normalize to the period start in `%Y-%m-%dT%H:%M:%S`.

use crate::domain::{Granularity, MalformedRecord, RawRecord, Reading};
use chrono::{NaiveDate, NaiveDateTime};

/// Normalize one raw record at the given granularity
///
/// Deterministic: the same raw record always yields the same reading.
///
/// # Errors
///
/// Returns [`MalformedRecord`] when the node, value, or timestamp cannot be
/// parsed. The error carries the node text for diagnostics.
pub fn normalize(raw: &RawRecord, granularity: Granularity) -> Result<Reading, MalformedRecord> {
    let node_id: i64 = raw.node.trim().parse().map_err(|_| {
        MalformedRecord::new(&raw.node, format!("unparseable node id '{}'", raw.node))
    })?;

    let value = parse_value(&raw.value)
        .ok_or_else(|| MalformedRecord::new(&raw.node, format!("unparseable value '{}'", raw.value)))?;

    let timestamp = parse_timestamp(raw.timestamp.trim(), granularity).ok_or_else(|| {
        MalformedRecord::new(
            &raw.node,
            format!(
                "unparseable timestamp '{}' for granularity '{granularity}'",
                raw.timestamp
            ),
        )
    })?;

    Ok(Reading {
        node_id,
        value,
        timestamp,
    })
}

/// Coerce the value field to a number, accepting the comma decimal
/// separator the service uses in some locales.
fn parse_value(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse().ok()
}

/// Granularity-tagged timestamp parser dispatch
fn parse_timestamp(raw: &str, granularity: Granularity) -> Option<NaiveDateTime> {
    match granularity {
        Granularity::Year => parse_year(raw),
        Granularity::QuarterYear => parse_quarter_year(raw),
        Granularity::Month => parse_month(raw),
        Granularity::Day => parse_day(raw).map(at_midnight),
        Granularity::Hour | Granularity::QuarterHour | Granularity::Minute => {
            parse_day_with_time(raw)
        }
    }
}

fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

fn parse_year(raw: &str) -> Option<NaiveDateTime> {
    let year: i32 = raw.parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1).map(at_midnight)
}

fn parse_quarter_year(raw: &str) -> Option<NaiveDateTime> {
    let (quarter, year) = raw.split_once('/')?;
    let month = match quarter.trim() {
        "I" | "Q1" => 1,
        "II" | "Q2" => 4,
        "III" | "Q3" => 7,
        "IV" | "Q4" => 10,
        _ => return None,
    };
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(at_midnight)
}

fn parse_month(raw: &str) -> Option<NaiveDateTime> {
    // chrono needs a complete date, so pin the day to the 1st
    for format in ["%m/%Y", "%Y-%m"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("01.{raw}"), &format!("%d.{format}")) {
            return Some(at_midnight(date));
        }
    }
    None
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    for format in ["%d.%m.%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    None
}

/// Parse `DD.MM.YYYY HH-HH` or `DD.MM.YYYY HH:MM`; a range keeps its start
fn parse_day_with_time(raw: &str) -> Option<NaiveDateTime> {
    let (day_part, time_part) = raw.split_once(' ')?;
    let date = parse_day(day_part.trim())?;

    let start = time_part.trim().split('-').next()?.trim();
    let (hour, minute) = match start.split_once(':') {
        Some((h, m)) => (h.parse().ok()?, m.parse().ok()?),
        None => (start.parse().ok()?, 0),
    };
    date.and_hms_opt(hour, minute, 0)
}
