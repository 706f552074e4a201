//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the extractor using
//! clap. The extractor follows the data-folder contract: configuration,
//! state, and output all live under one directory.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Energis energy readings extractor
#[derive(Parser, Debug)]
#[command(name = "energis-extractor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding config.json, in/, and out/
    #[arg(short, long, default_value = "/data", env = "ENERGIS_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ENERGIS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the extraction against the configured date range
    Extract(commands::extract::ExtractArgs),

    /// Validate the run configuration without calling the API
    ValidateConfig(commands::validate::ValidateArgs),
}
