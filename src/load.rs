// src/load.rs

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    io::BufReader,
    time::Instant,
};
use tracing::{debug, error, info, warn};

use crate::config::LoadConfig;
use crate::ingest::{IngestError, TargetHistoryReader};
use crate::record::TargetHistoryRecord;
use crate::writer::{ParquetTableWriter, TableWriter, WriteSummary};

/// Per-line outcome counts of one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data lines seen (header excluded).
    pub lines: u64,
    /// Records accepted by the writer and not lost in a failed batch.
    pub submitted: u64,
    pub parse_errors: u64,
    pub schema_errors: u64,
    pub read_errors: u64,
    /// Rows the writer rejected or lost.
    pub write_errors: u64,
}

impl LoadStats {
    pub fn failed(&self) -> u64 {
        self.parse_errors + self.schema_errors + self.read_errors + self.write_errors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub stats: LoadStats,
    pub output: WriteSummary,
}

/// Feed every record of `rows` to `writer`, logging and skipping lines that
/// fail to convert, fail to read, or are rejected by the writer.
///
/// With `max_errors = Some(n)` the load stops with an error as soon as more
/// than `n` lines have failed. The writer is left open either way; closing
/// it is the caller's job.
pub fn load_rows<I, W>(rows: I, writer: &mut W, max_errors: Option<u64>) -> Result<LoadStats>
where
    I: IntoIterator<Item = Result<TargetHistoryRecord, IngestError>>,
    W: TableWriter,
{
    let mut stats = LoadStats::default();

    for item in rows {
        stats.lines += 1;
        match item {
            Ok(record) => match writer.add_row(&record) {
                Ok(()) => stats.submitted += 1,
                Err(e) => {
                    // earlier rows of a lost batch were already counted as submitted
                    let lost = e.rows_lost();
                    stats.submitted = stats.submitted.saturating_sub(lost - 1);
                    stats.write_errors += lost;
                    error!(unique_id = %record.unique_id, rows = lost, error = %e, "writer rejected rows");
                }
            },
            Err(IngestError::Convert { line, source }) => {
                if source.is_schema() {
                    stats.schema_errors += 1;
                } else {
                    stats.parse_errors += 1;
                }
                warn!(line, error = %source, "skipping malformed line");
            }
            Err(e @ IngestError::Csv { .. }) => {
                stats.read_errors += 1;
                error!(line = e.line(), error = %e, "failed to read line");
            }
        }

        if let Some(max) = max_errors {
            if stats.failed() > max {
                bail!(
                    "aborting load: {} failed lines exceed max_errors = {}",
                    stats.failed(),
                    max
                );
            }
        }
    }

    Ok(stats)
}

/// Run one load as configured: read the input file, write one table file
/// under `<output_dir>/<keyspace>/<table>/`, and close the writer.
///
/// A failure to close the writer fails the run; an aborted run discards the
/// partial table file.
#[tracing::instrument(level = "info", skip(config), fields(input = %config.input.display()))]
pub fn run(config: &LoadConfig) -> Result<LoadSummary> {
    let start = Instant::now();
    config.validate()?;

    let table = config.table_schema();
    let table_dir = config.table_dir();
    fs::create_dir_all(&table_dir)
        .with_context(|| format!("Cannot create output directory: {}", table_dir.display()))?;
    debug!(insert = %table.insert_statement(), "target statement");

    let file = File::open(&config.input)
        .with_context(|| format!("Failed to open input file: {}", config.input.display()))?;
    let reader = TargetHistoryReader::new(BufReader::new(file));

    let mut writer = ParquetTableWriter::create(&table_dir, &table, config.writer_options())
        .with_context(|| format!("Failed to open table writer for {}", table.qualified_name()))?;

    let stats = match load_rows(reader, &mut writer, config.max_errors) {
        Ok(stats) => stats,
        Err(e) => {
            if let Err(discard_err) = writer.discard() {
                error!(error = %discard_err, "failed to remove partial table file");
            }
            return Err(e);
        }
    };

    let output = writer.close().context("Failed to close table writer")?;

    if stats.failed() > 0 {
        warn!(
            failed = stats.failed(),
            parse = stats.parse_errors,
            schema = stats.schema_errors,
            read = stats.read_errors,
            write = stats.write_errors,
            "some lines were skipped"
        );
    }
    info!(
        table = %table.qualified_name(),
        lines = stats.lines,
        rows = output.rows,
        elapsed = ?start.elapsed(),
        "load complete"
    );

    Ok(LoadSummary { stats, output })
}
