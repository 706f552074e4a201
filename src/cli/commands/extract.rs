//! Extract command implementation
//!
//! This module implements the `extract` command: one incremental run against
//! the Energis API, writing a CSV table and the updated cursor under the
//! data directory.

use crate::adapters::output::{table_path, CsvOutputWriter};
use crate::adapters::soap::EnergisClient;
use crate::config::load_config;
use crate::core::extract::ExtractCoordinator;
use crate::core::state::FileStateStore;
use crate::domain::errors::ExtractorError;
use chrono::NaiveDate;
use clap::Args;
use std::path::Path;
use std::sync::Arc;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Ignore the stored cursor and backfill from date_from
    #[arg(long)]
    pub reload_full_data: bool,

    /// Override the configured start date (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<NaiveDate>,

    /// Override the configured end date (YYYY-MM-DD)
    #[arg(long)]
    pub date_to: Option<NaiveDate>,
}

impl ExtractArgs {
    /// Execute the extract command, returning the process exit code
    pub async fn execute(&self, data_dir: &Path) -> anyhow::Result<i32> {
        tracing::info!(data_dir = %data_dir.display(), "Starting extract command");

        let config_path = data_dir.join("config.json");
        let mut config = match load_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Error: {e}");
                return Ok(exit_code(&e));
            }
        };

        // Apply CLI overrides
        if self.reload_full_data {
            tracing::info!("Enabling full reload from CLI");
            config.sync_options.reload_full_data = true;
        }
        if let Some(date_from) = self.date_from {
            tracing::info!(date_from = %date_from, "Overriding date_from from CLI");
            config.sync_options.date_from = date_from;
        }
        if let Some(date_to) = self.date_to {
            tracing::info!(date_to = %date_to, "Overriding date_to from CLI");
            config.sync_options.date_to = Some(date_to);
        }

        let out_path = table_path(
            data_dir,
            config.sync_options.dataset,
            config.sync_options.granularity,
        );

        let run = async {
            let client = EnergisClient::new(&config.authentication, config.debug)?;
            let mut writer = CsvOutputWriter::create(out_path)?;
            let coordinator = ExtractCoordinator::new(
                config,
                Arc::new(client),
                Box::new(FileStateStore::new(data_dir)),
            );
            coordinator.execute(&mut writer).await
        };

        match run.await {
            Ok(summary) => {
                summary.log_summary();
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Extraction failed");
                eprintln!("Error: {e}");
                Ok(exit_code(&e))
            }
        }
    }
}

/// Exit code contract: 1 for user-correctable errors, 2 for unexpected ones
fn exit_code(err: &ExtractorError) -> i32 {
    if err.is_user_error() {
        1
    } else {
        2
    }
}
