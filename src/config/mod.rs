//! Configuration management
//!
//! JSON schema types, the file loader, and secure credential wrappers.

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{Authentication, Dataset, Environment, ExtractorConfig, RetryConfig, SyncOptions};
pub use secret::{secret_string, SecretString, SecretValue};
