//! Result type alias for extractor operations

use super::errors::ExtractorError;

/// Result type alias using [`ExtractorError`] as the error type
///
/// Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use energis_extractor::domain::result::Result;
/// use energis_extractor::domain::errors::ExtractorError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExtractorError::Configuration("invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExtractorError>;
