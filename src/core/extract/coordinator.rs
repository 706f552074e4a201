//! Extraction coordinator
//!
//! Drives one run end to end: load state, resolve the window, chunk it,
//! authenticate, fetch and normalize chunk by chunk, and commit the cursor.
//! Chunks run sequentially in chronological order; the cursor only ever
//! advances past chunks that were fetched and written completely, so an
//! interrupted run resumes without gaps.

use crate::adapters::output::OutputWriter;
use crate::adapters::soap::{with_retry, EnergisApi};
use crate::config::ExtractorConfig;
use crate::core::chunker;
use crate::core::extract::RunSummary;
use crate::core::normalizer;
use crate::core::resolver;
use crate::core::state::{ExtractionState, StateStore};
use crate::domain::errors::ExtractorError;
use crate::domain::result::Result;
use crate::domain::{DateWindow, CANONICAL_TIMESTAMP_FORMAT};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates one extraction run
pub struct ExtractCoordinator {
    config: ExtractorConfig,
    api: Arc<dyn EnergisApi>,
    state_store: Box<dyn StateStore>,
}

impl ExtractCoordinator {
    pub fn new(
        config: ExtractorConfig,
        api: Arc<dyn EnergisApi>,
        state_store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            config,
            api,
            state_store,
        }
    }

    /// Run the extraction, writing readings to `writer`
    ///
    /// On failure mid-run the output written so far is flushed and the
    /// cursor is committed up to the last completed chunk before the error
    /// propagates.
    pub async fn execute(&self, writer: &mut dyn OutputWriter) -> Result<RunSummary> {
        let started = Instant::now();

        let state = self.load_state();
        let window = resolver::resolve_window(
            &self.config.sync_options,
            state.as_ref(),
            Local::now().date_naive(),
        )?;

        let mut summary = RunSummary::default();

        if window.is_empty() {
            tracing::info!("Date window is empty, nothing to fetch");
            writer.finish()?;
            summary.duration = started.elapsed();
            return Ok(summary);
        }

        let nodes = &self.config.sync_options.nodes;
        let chunks: Vec<DateWindow> = chunker::chunks(window, nodes.len()).collect();
        summary.chunks_total = chunks.len();

        tracing::info!(
            start = %window.start.format(CANONICAL_TIMESTAMP_FORMAT),
            end = %window.end.format(CANONICAL_TIMESTAMP_FORMAT),
            granularity = %window.granularity,
            nodes = nodes.len(),
            chunks = chunks.len(),
            "Starting extraction"
        );

        let key = with_retry(&self.config.retry, || self.api.authenticate()).await?;

        // Cursor value safe to persist: max timestamp over completed chunks
        let mut committable: Option<NaiveDateTime> = None;

        for (i, chunk) in chunks.iter().enumerate() {
            let index = i + 1;
            tracing::debug!(
                chunk = index,
                total = summary.chunks_total,
                start = %chunk.start.format(CANONICAL_TIMESTAMP_FORMAT),
                end = %chunk.end.format(CANONICAL_TIMESTAMP_FORMAT),
                "Fetching chunk"
            );

            let fetched =
                with_retry(&self.config.retry, || self.api.fetch_window(&key, chunk, nodes)).await;

            let records = match fetched {
                Ok(records) => records,
                Err(source) => {
                    let err = ExtractorError::Chunk {
                        index,
                        total: summary.chunks_total,
                        window: format_window(chunk),
                        source,
                    };
                    self.abort(writer, committable);
                    return Err(err);
                }
            };

            let mut chunk_max: Option<NaiveDateTime> = None;
            for raw in &records {
                match normalizer::normalize(raw, chunk.granularity) {
                    Ok(reading) => {
                        if let Err(e) = writer.write(&reading) {
                            self.abort(writer, committable);
                            return Err(e);
                        }
                        summary.rows_written += 1;
                        chunk_max = chunk_max.max(Some(reading.timestamp));
                    }
                    Err(malformed) => {
                        tracing::warn!(error = %malformed, "Skipping malformed record");
                        summary.records_skipped += 1;
                    }
                }
            }

            summary.chunks_completed += 1;
            committable = committable.max(chunk_max);
        }

        writer.finish()?;

        // No new readings means no cursor movement; the platform keeps the
        // previous state when none is written.
        if let Some(cursor) = committable {
            self.state_store.commit(&ExtractionState::new(cursor))?;
            summary.max_timestamp = Some(cursor);
        }

        summary.duration = started.elapsed();
        Ok(summary)
    }

    /// Load the prior cursor, treating corruption as a first run
    fn load_state(&self) -> Option<ExtractionState> {
        match self.state_store.load() {
            Ok(state) => state,
            Err(ExtractorError::StateCorruption(msg)) => {
                tracing::warn!(error = %msg, "State file is corrupt, falling back to date_from");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load state, falling back to date_from");
                None
            }
        }
    }

    /// Best-effort cleanup on a failed run: flush what was written and keep
    /// the cursor at the last completed chunk
    fn abort(&self, writer: &mut dyn OutputWriter, committable: Option<NaiveDateTime>) {
        if let Err(e) = writer.finish() {
            tracing::warn!(error = %e, "Failed to flush output during abort");
        }
        if let Some(cursor) = committable {
            if let Err(e) = self.state_store.commit(&ExtractionState::new(cursor)) {
                tracing::warn!(error = %e, "Failed to commit state during abort");
            }
        }
    }
}

fn format_window(window: &DateWindow) -> String {
    format!(
        "{}..{}",
        window.start.format(CANONICAL_TIMESTAMP_FORMAT),
        window.end.format(CANONICAL_TIMESTAMP_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::soap::SessionKey;
    use crate::config::{
        secret_string, Authentication, Dataset, Environment, RetryConfig, SyncOptions,
    };
    use crate::domain::{ApiError, Granularity, RawRecord, Reading};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted API returning queued responses in order
    struct ScriptedApi {
        responses: Mutex<VecDeque<std::result::Result<Vec<RawRecord>, ApiError>>>,
        auth_failures: Mutex<u32>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<std::result::Result<Vec<RawRecord>, ApiError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                auth_failures: Mutex::new(0),
            }
        }

        fn with_auth_failures(self, n: u32) -> Self {
            *self.auth_failures.lock().unwrap() = n;
            self
        }
    }

    #[async_trait]
    impl EnergisApi for ScriptedApi {
        async fn authenticate(&self) -> std::result::Result<SessionKey, ApiError> {
            let mut failures = self.auth_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ApiError::Transient("session still open".to_string()));
            }
            Ok(SessionKey::new("test-key".to_string()))
        }

        async fn fetch_window(
            &self,
            _key: &SessionKey,
            _window: &DateWindow,
            _nodes: &[i64],
        ) -> std::result::Result<Vec<RawRecord>, ApiError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }
    }

    #[derive(Default)]
    struct VecWriter {
        rows: Vec<Reading>,
        finished: bool,
    }

    impl OutputWriter for VecWriter {
        fn write(&mut self, reading: &Reading) -> Result<()> {
            self.rows.push(reading.clone());
            Ok(())
        }

        fn rows_written(&self) -> u64 {
            self.rows.len() as u64
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn config(date_from: &str, date_to: &str, granularity: Granularity) -> ExtractorConfig {
        ExtractorConfig {
            authentication: Authentication {
                username: "user".to_string(),
                password: secret_string("pass".to_string()),
                environment: Environment::Dev,
            },
            sync_options: SyncOptions {
                dataset: Dataset::Xexport,
                nodes: vec![7090001],
                date_from: date_from.parse().unwrap(),
                date_to: Some(date_to.parse().unwrap()),
                granularity,
                reload_full_data: false,
            },
            retry: RetryConfig {
                max_attempts: 2,
                initial_delay_ms: 1,
                max_delay_ms: 2,
                backoff_multiplier: 1.0,
            },
            debug: false,
        }
    }

    fn raw(node: &str, value: &str, timestamp: &str) -> RawRecord {
        RawRecord {
            node: node.to_string(),
            value: value.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn coordinator(
        config: ExtractorConfig,
        api: ScriptedApi,
        dir: &TempDir,
    ) -> ExtractCoordinator {
        ExtractCoordinator::new(
            config,
            Arc::new(api),
            Box::new(crate::core::state::FileStateStore::new(dir.path())),
        )
    }

    fn committed_cursor(dir: &TempDir) -> Option<String> {
        let contents = std::fs::read_to_string(dir.path().join("out/state.json")).ok()?;
        let state: serde_json::Value = serde_json::from_str(&contents).unwrap();
        Some(state["last_processed"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_successful_run_commits_max_timestamp() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new(vec![Ok(vec![
            raw("7090001", "12.5", "16.06.2024"),
            raw("7090001", "11.0", "15.06.2024"),
        ])]);
        let coordinator = coordinator(config("2024-06-15", "2024-06-17", Granularity::Day), api, &dir);

        let mut writer = VecWriter::default();
        let summary = coordinator.execute(&mut writer).await.unwrap();

        assert_eq!(summary.chunks_total, 1);
        assert_eq!(summary.chunks_completed, 1);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.records_skipped, 0);
        assert!(writer.finished);
        assert_eq!(
            committed_cursor(&dir).as_deref(),
            Some("2024-06-16T00:00:00")
        );
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new(vec![Ok(vec![
            raw("7090001", "12.5", "15.06.2024"),
            raw("7090001", "N/A", "15.06.2024"),
            raw("bad-node", "1.0", "15.06.2024"),
        ])]);
        let coordinator = coordinator(config("2024-06-15", "2024-06-16", Granularity::Day), api, &dir);

        let mut writer = VecWriter::default();
        let summary = coordinator.execute(&mut writer).await.unwrap();

        assert_eq!(summary.rows_written, 1);
        assert_eq!(summary.records_skipped, 2);
        assert_eq!(writer.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_chunk_failure_commits_only_completed_chunks() {
        // Minute granularity with one node chunks at 36 days, so this
        // 60-day window splits into two chunks.
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new(vec![
            Ok(vec![raw("7090001", "1.0", "15.01.2024 08:00")]),
            Err(ApiError::Transient("connection reset".to_string())),
            Err(ApiError::Transient("connection reset".to_string())),
        ]);
        let coordinator =
            coordinator(config("2024-01-01", "2024-03-01", Granularity::Minute), api, &dir);

        let mut writer = VecWriter::default();
        let err = coordinator.execute(&mut writer).await.unwrap_err();

        assert!(matches!(
            err,
            ExtractorError::Chunk {
                index: 2,
                total: 2,
                ..
            }
        ));
        // Output flushed, cursor stops at the completed first chunk
        assert!(writer.finished);
        assert_eq!(writer.rows.len(), 1);
        assert_eq!(
            committed_cursor(&dir).as_deref(),
            Some("2024-01-15T08:00:00")
        );
    }

    #[tokio::test]
    async fn test_transient_auth_failure_is_retried() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new(vec![Ok(vec![raw("7090001", "5.0", "15.06.2024")])])
            .with_auth_failures(1);
        let coordinator = coordinator(config("2024-06-15", "2024-06-16", Granularity::Day), api, &dir);

        let mut writer = VecWriter::default();
        let summary = coordinator.execute(&mut writer).await.unwrap();
        assert_eq!(summary.rows_written, 1);
    }

    #[tokio::test]
    async fn test_empty_response_leaves_cursor_unchanged() {
        let dir = TempDir::new().unwrap();
        let api = ScriptedApi::new(vec![Ok(vec![])]);
        let coordinator = coordinator(config("2024-06-15", "2024-06-16", Granularity::Day), api, &dir);

        let mut writer = VecWriter::default();
        let summary = coordinator.execute(&mut writer).await.unwrap();

        assert_eq!(summary.rows_written, 0);
        assert_eq!(summary.max_timestamp, None);
        assert_eq!(committed_cursor(&dir), None);
    }

    #[tokio::test]
    async fn test_empty_window_is_a_noop() {
        let dir = TempDir::new().unwrap();

        // Prior cursor already at date_to, so the resolved window is empty
        let in_dir = dir.path().join("in");
        std::fs::create_dir_all(&in_dir).unwrap();
        std::fs::write(
            in_dir.join("state.json"),
            r#"{"last_processed":"2024-06-16T00:00:00"}"#,
        )
        .unwrap();

        let api = ScriptedApi::new(vec![]);
        let coordinator = coordinator(config("2024-06-15", "2024-06-16", Granularity::Day), api, &dir);

        let mut writer = VecWriter::default();
        let summary = coordinator.execute(&mut writer).await.unwrap();

        assert_eq!(summary.chunks_total, 0);
        assert_eq!(summary.rows_written, 0);
        assert!(writer.finished);
        assert_eq!(committed_cursor(&dir), None);
    }

    #[tokio::test]
    async fn test_corrupt_state_falls_back_to_date_from() {
        let dir = TempDir::new().unwrap();
        let in_dir = dir.path().join("in");
        std::fs::create_dir_all(&in_dir).unwrap();
        std::fs::write(in_dir.join("state.json"), "not json").unwrap();

        let api = ScriptedApi::new(vec![Ok(vec![raw("7090001", "2.0", "15.06.2024")])]);
        let coordinator = coordinator(config("2024-06-15", "2024-06-16", Granularity::Day), api, &dir);

        let mut writer = VecWriter::default();
        let summary = coordinator.execute(&mut writer).await.unwrap();
        assert_eq!(summary.rows_written, 1);
    }

    #[test]
    fn test_reading_timestamp_of_day_granularity() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let reading =
            normalizer::normalize(&raw("1", "1.0", "16.06.2024"), Granularity::Day).unwrap();
        assert_eq!(reading.timestamp, expected);
    }
}
