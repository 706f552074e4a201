//! Domain models and types for the extractor
//!
//! The domain layer provides:
//! - **Error types** ([`ExtractorError`], [`ApiError`], [`MalformedRecord`])
//! - **Result type alias** ([`Result`])
//! - **Core models** ([`Reading`], [`RawRecord`], [`DateWindow`], [`Granularity`])
//!
//! All fallible operations return [`Result<T, ExtractorError>`]; per-record
//! normalization failures use the lightweight [`MalformedRecord`] error that
//! never escapes the normalization loop.

pub mod errors;
pub mod granularity;
pub mod reading;
pub mod result;
pub mod window;

// Re-export commonly used types for convenience
pub use errors::{ApiError, ExtractorError, MalformedRecord};
pub use granularity::Granularity;
pub use reading::{RawRecord, Reading, CANONICAL_TIMESTAMP_FORMAT};
pub use result::Result;
pub use window::DateWindow;
