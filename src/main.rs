// Energis Extractor - incremental energy readings export
// Copyright (c) 2025 Energis Extractor Contributors
// Licensed under the MIT License

use clap::Parser;
use energis_extractor::cli::{Cli, Commands};
use energis_extractor::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = cli.log_level.as_deref().unwrap_or("info");
    if let Err(e) = init_logging(log_level) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Energis readings extractor"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            2
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Extract(args) => args.execute(&cli.data_dir).await,
        Commands::ValidateConfig(args) => args.execute(&cli.data_dir).await,
    }
}
