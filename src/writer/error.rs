// src/writer/error.rs

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a table writer while accepting or persisting rows.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Filesystem failure on the table file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Buffered rows could not be assembled into a record batch
    #[error("building record batch: {0}")]
    Arrow(#[from] ArrowError),

    /// The Parquet encoder rejected a batch or failed to finish the file
    #[error("parquet write failed: {0}")]
    Parquet(#[from] ParquetError),

    /// A buffered batch failed to encode; none of its rows were persisted
    #[error("batch of {rows} rows lost: {source}")]
    BatchLost {
        rows: u64,
        #[source]
        source: Box<WriterError>,
    },
}

impl WriterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WriterError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn batch_lost(rows: u64, source: WriterError) -> Self {
        WriterError::BatchLost {
            rows,
            source: Box::new(source),
        }
    }

    /// Rows this error cost, counting the row being added when it surfaced.
    pub fn rows_lost(&self) -> u64 {
        match self {
            WriterError::BatchLost { rows, .. } => (*rows).max(1),
            _ => 1,
        }
    }
}
