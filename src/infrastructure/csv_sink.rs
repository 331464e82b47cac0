//! CSV result sink
//!
//! Writes the accumulated listings to a timestamped file with the columns
//! `url,price,rating`. The header is written even when there are no rows.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::domain::ListingRecord;
use crate::infrastructure::config::OutputConfig;

pub const CSV_HEADER: [&str; 3] = ["url", "price", "rating"];

/// Timestamp layout used in output file names
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to create output file {path:?}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while writing results: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for the final result set
pub trait ResultSink {
    /// Persist all records, returning where they went
    fn write(&self, records: &[ListingRecord]) -> Result<PathBuf, SinkError>;
}

pub struct CsvResultSink {
    output_path: PathBuf,
}

impl CsvResultSink {
    /// Sink whose file name is stamped with the crawl start time
    pub fn new(config: &OutputConfig, started_at: DateTime<Local>) -> Self {
        let file_name = format!(
            "{}_{}.csv",
            config.file_prefix,
            started_at.format(FILE_TIMESTAMP_FORMAT)
        );
        Self {
            output_path: config.directory.join(file_name),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Header plus one row per record, in accumulation order
    pub fn write_to<W: Write>(writer: W, records: &[ListingRecord]) -> Result<(), SinkError> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;
        for record in records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl ResultSink for CsvResultSink {
    fn write(&self, records: &[ListingRecord]) -> Result<PathBuf, SinkError> {
        let file = File::create(&self.output_path).map_err(|source| SinkError::Create {
            path: self.output_path.clone(),
            source,
        })?;
        Self::write_to(file, records)?;

        info!("💾 Wrote {} listings to {:?}", records.len(), self.output_path);
        Ok(self.output_path.clone())
    }
}
