//! Output boundary
//!
//! The extraction core hands normalized readings to an [`OutputWriter`] and
//! never touches the destination directly. The shipped implementation writes
//! platform-convention CSV tables under `<data>/out/tables/`.

use crate::config::Dataset;
use crate::domain::errors::ExtractorError;
use crate::domain::result::Result;
use crate::domain::{Granularity, Reading};
use csv::Writer;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Destination for normalized readings
pub trait OutputWriter {
    /// Append one reading
    fn write(&mut self, reading: &Reading) -> Result<()>;

    /// Rows written so far
    fn rows_written(&self) -> u64;

    /// Flush buffers and close the destination
    fn finish(&mut self) -> Result<()>;
}

/// Output table path for a dataset and granularity, e.g.
/// `<data>/out/tables/energis_xexport_quarter_hour_data.csv`
pub fn table_path(data_dir: &Path, dataset: Dataset, granularity: Granularity) -> PathBuf {
    data_dir.join("out").join("tables").join(format!(
        "energis_{}_{}_data.csv",
        dataset.as_str(),
        granularity.file_label()
    ))
}

/// CSV implementation of [`OutputWriter`]
///
/// Columns are `node_id,value,timestamp` with a header row; timestamps use
/// the canonical format.
pub struct CsvOutputWriter {
    writer: Writer<File>,
    path: PathBuf,
    rows: u64,
}

impl CsvOutputWriter {
    /// Create the writer, creating parent directories as needed. Truncates
    /// any previous table at the same path.
    pub fn create(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ExtractorError::Output(format!("failed to create {}: {e}", parent.display())))?;
        }
        let file = File::create(&path)
            .map_err(|e| ExtractorError::Output(format!("failed to create {}: {e}", path.display())))?;

        Ok(Self {
            writer: Writer::from_writer(file),
            path,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputWriter for CsvOutputWriter {
    fn write(&mut self, reading: &Reading) -> Result<()> {
        self.writer
            .serialize(reading)
            .map_err(|e| ExtractorError::Output(format!("failed to write row: {e}")))?;
        self.rows += 1;
        Ok(())
    }

    fn rows_written(&self) -> u64 {
        self.rows
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ExtractorError::Output(format!("failed to flush output: {e}")))?;
        tracing::info!(path = %self.path.display(), rows = self.rows, "Output table written");
        Ok(())
    }
}
