// Energis Extractor - incremental energy readings export
// Copyright (c) 2025 Energis Extractor Contributors
// Licensed under the MIT License

//! # Energis Extractor
//!
//! Incremental extractor for energy-consumption readings from the Energis
//! SOAP API. Each run fetches the readings that appeared since the previous
//! run, normalizes them into a canonical tabular form, and writes them as a
//! CSV table plus an updated state cursor.
//!
//! ## Overview
//!
//! One run performs these steps:
//! - **Resolve** the effective date window from configuration and the stored
//!   cursor
//! - **Chunk** the window into API-call-sized sub-windows based on
//!   granularity and node count
//! - **Fetch** each chunk sequentially over SOAP, with bounded retry for
//!   transient failures
//! - **Normalize** raw records into readings with canonical timestamps,
//!   skipping malformed rows
//! - **Commit** the cursor up to the last fully completed chunk
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (resolver, chunker, normalizer, state, run
//!   coordination)
//! - [`adapters`] - External integrations (SOAP API, CSV output)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use energis_extractor::adapters::output::CsvOutputWriter;
//! use energis_extractor::adapters::soap::EnergisClient;
//! use energis_extractor::config::load_config;
//! use energis_extractor::core::extract::ExtractCoordinator;
//! use energis_extractor::core::state::FileStateStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("/data/config.json")?;
//!     let client = EnergisClient::new(&config.authentication, config.debug)?;
//!     let mut writer = CsvOutputWriter::create("/data/out/tables/readings.csv".into())?;
//!
//!     let coordinator = ExtractCoordinator::new(
//!         config,
//!         Arc::new(client),
//!         Box::new(FileStateStore::new("/data")),
//!     );
//!
//!     let summary = coordinator.execute(&mut writer).await?;
//!     println!("Wrote {} readings", summary.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Incremental Sync
//!
//! The extractor persists the maximum timestamp among written readings as
//! `{"last_processed": "..."}` in `out/state.json`. The next run starts from
//! that cursor, so already-fetched data is not requested again. A full
//! backfill can be forced with `reload_full_data`.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::errors::ExtractorError`].
//! Transient API failures are retried with exponential backoff; malformed
//! records are skipped and counted rather than failing the run.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
