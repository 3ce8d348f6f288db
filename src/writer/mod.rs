// src/writer/mod.rs

pub mod batch;
pub mod error;
pub mod parquet_file;
pub mod read;

use std::path::PathBuf;

use crate::record::TargetHistoryRecord;

pub use self::batch::{records_from_batch, RecordBuilders};
pub use self::error::WriterError;
pub use self::parquet_file::{ParquetTableWriter, TableCompression, WriterOptions};
pub use self::read::{read_table, read_table_head, table_metadata, TableFileInfo};

/// What a writer persisted by the time it was closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    /// Final table file, or `None` when no row was written.
    pub path: Option<PathBuf>,
    pub rows: u64,
    pub batches: u64,
    pub bytes: u64,
}

/// Bulk-load collaborator: accepts typed rows for one table and persists
/// them in its own on-disk format.
///
/// `close` consumes the writer, so it runs at most once.
pub trait TableWriter {
    fn add_row(&mut self, record: &TargetHistoryRecord) -> Result<(), WriterError>;

    fn close(self) -> Result<WriteSummary, WriterError>
    where
        Self: Sized;
}
