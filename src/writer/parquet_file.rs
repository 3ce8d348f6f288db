// src/writer/parquet_file.rs

use arrow::datatypes::Schema as ArrowSchema;
use chrono::Utc;
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression, ZstdLevel},
    file::properties::WriterProperties,
    format::KeyValue,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

use super::{RecordBuilders, TableWriter, WriteSummary, WriterError};
use crate::record::TargetHistoryRecord;
use crate::schema::TableSchema;

pub const META_KEYSPACE: &str = "bulkload.keyspace";
pub const META_TABLE: &str = "bulkload.table";
pub const META_PRIMARY_KEY: &str = "bulkload.primary_key";
pub const META_CREATE_STATEMENT: &str = "bulkload.create_statement";

/// Compression codec for table files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableCompression {
    #[default]
    Snappy,
    Zstd,
    Brotli,
    Uncompressed,
}

impl TableCompression {
    fn codec(self) -> Result<Compression, WriterError> {
        Ok(match self {
            TableCompression::Snappy => Compression::SNAPPY,
            TableCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            TableCompression::Brotli => Compression::BROTLI(BrotliLevel::try_new(5)?),
            TableCompression::Uncompressed => Compression::UNCOMPRESSED,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Rows buffered before a batch is handed to the encoder.
    pub batch_rows: usize,
    pub compression: TableCompression,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            batch_rows: 8192,
            compression: TableCompression::Snappy,
        }
    }
}

/// Writes one Parquet file per run for a table.
///
/// Rows go to `<name>.parquet.tmp` while the writer is open; `close` renames
/// the file to `<name>.parquet`, so readers never see a half-written table.
pub struct ParquetTableWriter {
    schema: Arc<ArrowSchema>,
    table: String,
    builders: RecordBuilders,
    writer: ArrowWriter<File>,
    batch_rows: usize,
    temp_path: PathBuf,
    out_path: PathBuf,
    rows: u64,
    batches: u64,
}

impl ParquetTableWriter {
    /// Open a new table file under `dir` (which must exist).
    pub fn create(
        dir: &Path,
        table: &TableSchema,
        opts: WriterOptions,
    ) -> Result<Self, WriterError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%6f");
        let file_name = format!("{}-{}-{}.parquet", table.keyspace, table.table, stamp);
        let out_path = dir.join(&file_name);
        let temp_path = dir.join(format!("{}.tmp", file_name));

        let metadata = vec![
            KeyValue {
                key: META_KEYSPACE.to_string(),
                value: Some(table.keyspace.clone()),
            },
            KeyValue {
                key: META_TABLE.to_string(),
                value: Some(table.table.clone()),
            },
            KeyValue {
                key: META_PRIMARY_KEY.to_string(),
                value: Some(table.primary_key.join(",")),
            },
            KeyValue {
                key: META_CREATE_STATEMENT.to_string(),
                value: Some(table.create_statement()),
            },
        ];
        let props = WriterProperties::builder()
            .set_compression(opts.compression.codec()?)
            .set_dictionary_enabled(true)
            .set_key_value_metadata(Some(metadata))
            .build();

        let schema = table.arrow_schema();
        let file = File::create(&temp_path).map_err(|e| WriterError::io(&temp_path, e))?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        debug!(table = %table.qualified_name(), path = %temp_path.display(), "opened table writer");

        Ok(ParquetTableWriter {
            schema,
            table: table.qualified_name(),
            builders: RecordBuilders::new(),
            writer,
            batch_rows: opts.batch_rows.max(1),
            temp_path,
            out_path,
            rows: 0,
            batches: 0,
        })
    }

    fn flush(&mut self) -> Result<(), WriterError> {
        if self.builders.is_empty() {
            return Ok(());
        }
        let rows = self.builders.len() as u64;
        let batch = self
            .builders
            .finish(self.schema.clone())
            .map_err(|e| WriterError::batch_lost(rows, e.into()))?;
        self.writer
            .write(&batch)
            .map_err(|e| WriterError::batch_lost(rows, e.into()))?;
        self.rows += rows;
        self.batches += 1;
        debug!(table = %self.table, batch = self.batches, rows, "flushed batch");
        Ok(())
    }

    /// Drop the writer without publishing a table file.
    pub fn discard(self) -> Result<(), WriterError> {
        let temp_path = self.temp_path;
        drop(self.writer);
        remove_temp(&temp_path)
    }

    fn finish(mut self) -> Result<WriteSummary, WriterError> {
        self.flush()?;
        self.writer.close()?;

        if self.rows == 0 {
            remove_temp(&self.temp_path)?;
            warn!(table = %self.table, "no rows written; table file not kept");
            return Ok(WriteSummary::default());
        }

        fs::rename(&self.temp_path, &self.out_path)
            .map_err(|e| WriterError::io(&self.out_path, e))?;
        let bytes = fs::metadata(&self.out_path)
            .map_err(|e| WriterError::io(&self.out_path, e))?
            .len();

        info!(
            table = %self.table,
            path = %self.out_path.display(),
            rows = self.rows,
            bytes,
            "table file written"
        );

        Ok(WriteSummary {
            path: Some(self.out_path),
            rows: self.rows,
            batches: self.batches,
            bytes,
        })
    }
}

fn remove_temp(path: &Path) -> Result<(), WriterError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WriterError::io(path, e)),
    }
}

impl TableWriter for ParquetTableWriter {
    fn add_row(&mut self, record: &TargetHistoryRecord) -> Result<(), WriterError> {
        self.builders.append(record);
        if self.builders.len() >= self.batch_rows {
            self.flush()?;
        }
        Ok(())
    }

    /// A failed close never leaves the temp file behind.
    fn close(self) -> Result<WriteSummary, WriterError> {
        let temp_path = self.temp_path.clone();
        self.finish().map_err(|e| {
            if let Err(cleanup) = remove_temp(&temp_path) {
                warn!(error = %cleanup, "failed to remove temp table file");
            }
            e
        })
    }
}
