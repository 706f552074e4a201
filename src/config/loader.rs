//! Configuration loader
//!
//! Reads the JSON run configuration from disk, parses it into
//! [`ExtractorConfig`] and validates it. All failures map to
//! [`ExtractorError::Configuration`] so they surface before any network call.

use super::schema::ExtractorConfig;
use crate::domain::errors::ExtractorError;
use crate::domain::result::Result;
use std::fs;
use std::path::Path;

/// Loads and validates configuration from a JSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read, the JSON does not match the
/// schema, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use energis_extractor::config::load_config;
///
/// let config = load_config("/data/config.json").expect("failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExtractorConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExtractorError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExtractorError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: ExtractorConfig = serde_json::from_str(&contents)
        .map_err(|e| ExtractorError::Configuration(format!("Failed to parse JSON: {e}")))?;

    config
        .validate()
        .map_err(|e| ExtractorError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r##"{
                "authentication": {"username": "u", "#password": "p"},
                "sync_options": {"nodes": [7090001], "date_from": "2024-01-01"}
            }"##,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sync_options.nodes, vec![7090001]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, ExtractorError::Configuration(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_malformed_json() {
        let file = write_config("{ not json");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_load_invalid_config_fails_validation() {
        let file = write_config(
            r##"{
                "authentication": {"username": "u", "#password": "p"},
                "sync_options": {"nodes": []}
            }"##,
        );

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("nodes cannot be empty"));
    }
}
