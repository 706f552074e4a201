//! Validate config command implementation
//!
//! This module implements the `validate-config` command, which checks the
//! run configuration without touching the network or the state file.

use crate::config::load_config;
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command, returning the process exit code
    pub async fn execute(&self, data_dir: &Path) -> anyhow::Result<i32> {
        let config_path = data_dir.join("config.json");
        tracing::info!(config_path = %config_path.display(), "Validating configuration");

        println!("Validating configuration file: {}", config_path.display());

        let config = match load_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                println!("Configuration is invalid");
                println!("  Error: {e}");
                return Ok(1);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration summary:");
        println!("  Username: {}", config.authentication.username);
        println!(
            "  Environment: {}",
            config.authentication.environment.base_url()
        );
        println!("  Dataset: {}", config.sync_options.dataset.as_str());
        println!("  Nodes: {}", config.sync_options.nodes.len());
        println!("  Date from: {}", config.sync_options.date_from);
        match config.sync_options.date_to {
            Some(date_to) => println!("  Date to: {date_to}"),
            None => println!("  Date to: today"),
        }
        println!("  Granularity: {}", config.sync_options.granularity);
        println!("  Full reload: {}", config.sync_options.reload_full_data);

        Ok(0)
    }
}
