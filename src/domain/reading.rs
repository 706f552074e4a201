//! Reading and raw record models
//!
//! A [`RawRecord`] is the opaque key-value shape the SOAP API returns per
//! (node, timestamp) pair. The normalizer converts it into a [`Reading`]
//! with a canonical timestamp, after which it is immutable.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Canonical timestamp format for output rows and state cursors
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A raw record as returned by the xexport operation, prior to normalization
///
/// Fields keep the wire tag names (`uzel` = node, `hodnota` = value,
/// `cas` = timestamp) untranslated until normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Node identifier, as text
    pub node: String,
    /// Measurement value, as text (may use a comma decimal separator)
    pub value: String,
    /// Timestamp in a granularity-specific source format
    pub timestamp: String,
}

/// A normalized energy-consumption reading
///
/// Produced by the normalizer; same raw record always yields the same
/// reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Metering point identifier
    pub node_id: i64,
    /// Measured value
    pub value: f64,
    /// Period start in canonical format (serialized as `%Y-%m-%dT%H:%M:%S`)
    #[serde(serialize_with = "serialize_canonical")]
    pub timestamp: NaiveDateTime,
}

impl Reading {
    /// The timestamp rendered in the canonical output format
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(CANONICAL_TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_canonical<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string())
}
