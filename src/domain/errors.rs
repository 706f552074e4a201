//! Domain error types
//!
//! This module defines the error hierarchy for the extractor.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main extractor error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Configuration-related errors (bad dates, empty node list, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The resolved date window is inverted (start after end)
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    /// Errors from the remote Energis API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A chunk fetch failed after retries; carries the chunk position for
    /// diagnostics
    #[error("Chunk {index}/{total} ({window}) failed: {source}")]
    Chunk {
        index: usize,
        total: usize,
        window: String,
        #[source]
        source: ApiError,
    },

    /// Persisted state could not be parsed
    #[error("State corruption: {0}")]
    StateCorruption(String),

    /// State persistence errors other than corruption
    #[error("State error: {0}")]
    State(String),

    /// Output writing errors
    #[error("Output error: {0}")]
    Output(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExtractorError {
    /// Whether this error stems from user-provided input (configuration or
    /// credentials) rather than an unexpected runtime failure. Drives the
    /// process exit code.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ExtractorError::Configuration(_)
                | ExtractorError::InvalidRange { .. }
                | ExtractorError::Api(ApiError::AuthenticationFailed(_))
                | ExtractorError::Chunk {
                    source: ApiError::AuthenticationFailed(_),
                    ..
                }
        )
    }
}

/// Errors from calls against the Energis SOAP API
///
/// These errors don't expose the underlying HTTP client types. The retry
/// wrapper consults [`ApiError::is_transient`] to decide whether an attempt
/// may be repeated.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials were rejected or no session key was issued. Fatal, never retried.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network or service-side failure, eligible for bounded retry
    #[error("Transient request failure: {0}")]
    Transient(String),

    /// The response could not be parsed into records. Not retried.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// SOAP fault returned by the service
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl ApiError {
    /// Transient errors may be retried with backoff; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_) | ApiError::Timeout(_))
    }
}

/// Per-record normalization failure
///
/// Raised when a raw record's value or timestamp cannot be parsed. These are
/// recoverable: the offending record is skipped and counted, never propagated
/// past the normalization loop.
#[derive(Debug, Error)]
#[error("Malformed record (node {node}): {reason}")]
pub struct MalformedRecord {
    /// Node identifier as returned by the service
    pub node: String,
    /// What failed to parse
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            reason: reason.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExtractorError {
    fn from(err: std::io::Error) -> Self {
        ExtractorError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExtractorError {
    fn from(err: serde_json::Error) -> Self {
        ExtractorError::Serialization(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for ExtractorError {
    fn from(err: csv::Error) -> Self {
        ExtractorError::Output(err.to_string())
    }
}
