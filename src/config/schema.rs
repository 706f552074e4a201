//! Configuration schema types
//!
//! Maps the JSON run configuration (Keboola-style `config.json`) onto typed
//! structures. Key names follow the platform contract, including the
//! `#password` encrypted-field prefix.

use crate::config::SecretString;
use crate::domain::Granularity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Target API environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Test instance
    #[default]
    Dev,
    /// Production instance
    Prod,
}

impl Environment {
    /// Base URL of the SOAP endpoint for this environment
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Dev => "https://webenergis.eu/test/1.wsc/soap",
            Environment::Prod => "https://webenergis.eu/1.wsc/soap",
        }
    }
}

/// Supported remote dataset
///
/// Only the xexport readings export is supported; the enum keeps the config
/// surface explicit about that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    #[default]
    Xexport,
}

impl Dataset {
    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::Xexport => "xexport",
        }
    }
}

/// Main run configuration
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// API credentials and environment selection
    pub authentication: Authentication,

    /// What to fetch and for which range
    pub sync_options: SyncOptions,

    /// Retry policy for transient request failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Log masked request bodies at debug level
    #[serde(default)]
    pub debug: bool,
}

impl ExtractorConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.authentication.validate()?;
        self.sync_options.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

/// API credentials and environment selection
#[derive(Debug, Serialize, Deserialize)]
pub struct Authentication {
    /// Account username
    pub username: String,

    /// Account password. The `#` prefix marks the field as encrypted in the
    /// platform configuration store. Zeroed from memory on drop.
    #[serde(rename = "#password")]
    pub password: SecretString,

    /// Which API instance to call
    #[serde(default)]
    pub environment: Environment,
}

impl Authentication {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.username.trim().is_empty() {
            return Err("authentication.username cannot be empty".to_string());
        }
        if self.password.expose_secret().is_empty() {
            return Err("authentication.#password cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Fetch options: dataset, nodes, date range, granularity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Remote dataset to export
    #[serde(default)]
    pub dataset: Dataset,

    /// Metering point identifiers to fetch, e.g. [7090001]
    #[serde(default)]
    pub nodes: Vec<i64>,

    /// Date from which to fetch data
    #[serde(default = "default_date_from")]
    pub date_from: NaiveDate,

    /// Date to which to fetch data; defaults to the current date at run time
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Time resolution of the fetched readings
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,

    /// Ignore the stored cursor and backfill from `date_from`
    #[serde(default)]
    pub reload_full_data: bool,
}

impl SyncOptions {
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("sync_options.nodes cannot be empty".to_string());
        }
        if let Some(date_to) = self.date_to {
            if self.date_from > date_to {
                return Err(format!(
                    "sync_options.date_from ({}) must not be after date_to ({})",
                    self.date_from, date_to
                ));
            }
        }
        Ok(())
    }
}

/// Retry policy for transient request failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier applied per attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be > 0".to_string());
        }
        if self.max_attempts > 10 {
            return Err(format!(
                "retry.max_attempts must be <= 10, got {}",
                self.max_attempts
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err("retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

// Default value functions
fn default_date_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid constant date")
}

fn default_granularity() -> Granularity {
    Granularity::Day
}

fn default_max_attempts() -> usize {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}
