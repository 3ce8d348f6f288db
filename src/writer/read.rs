// src/writer/read.rs

use anyhow::{Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{collections::HashMap, fs::File, path::Path};

use super::batch::records_from_batch;
use super::parquet_file::{META_CREATE_STATEMENT, META_KEYSPACE, META_PRIMARY_KEY, META_TABLE};
use crate::record::TargetHistoryRecord;

/// Upper bound on rows decoded per batch when reading a limited head.
const BATCH_SIZE: usize = 1024;

/// Footer facts of a written table file.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFileInfo {
    pub keyspace: Option<String>,
    pub table: Option<String>,
    pub primary_key: Vec<String>,
    pub create_statement: Option<String>,
    pub rows: i64,
    pub row_groups: usize,
    pub created_by: Option<String>,
}

/// Read every record of a table file, in file order.
pub fn read_table(path: &Path) -> Result<Vec<TargetHistoryRecord>> {
    read_records(path, None)
}

/// Read at most `limit` records from the start of a table file.
///
/// Decoding stops at the batch that reaches `limit`; the rest of the file
/// is never read.
pub fn read_table_head(path: &Path, limit: usize) -> Result<Vec<TargetHistoryRecord>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    read_records(path, Some(limit))
}

fn read_records(path: &Path, limit: Option<usize>) -> Result<Vec<TargetHistoryRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet footer of {}", path.display()))?;
    if let Some(limit) = limit {
        builder = builder.with_batch_size(limit.min(BATCH_SIZE)).with_limit(limit);
    }
    let reader = builder.build().context("building record batch reader")?;

    let mut out = Vec::new();
    for batch in reader {
        let batch = batch.with_context(|| format!("reading batch from {}", path.display()))?;
        out.extend(records_from_batch(&batch)?);
        if limit.is_some_and(|l| out.len() >= l) {
            break;
        }
    }
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    Ok(out)
}

/// Read the table metadata a writer stamped into the file footer.
pub fn table_metadata(path: &Path) -> Result<TableFileInfo> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("reading parquet footer of {}", path.display()))?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    let kv: HashMap<&str, &str> = file_meta
        .key_value_metadata()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.value.as_deref().map(|v| (e.key.as_str(), v)))
                .collect()
        })
        .unwrap_or_default();

    Ok(TableFileInfo {
        keyspace: kv.get(META_KEYSPACE).map(|s| s.to_string()),
        table: kv.get(META_TABLE).map(|s| s.to_string()),
        primary_key: kv
            .get(META_PRIMARY_KEY)
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        create_statement: kv.get(META_CREATE_STATEMENT).map(|s| s.to_string()),
        rows: file_meta.num_rows(),
        row_groups: meta.num_row_groups(),
        created_by: file_meta.created_by().map(str::to_string),
    })
}
