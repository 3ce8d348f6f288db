// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::schema::TableSchema;
use crate::writer::{TableCompression, WriterOptions};

/// Options recognised by a load run.
///
/// Missing keys in a YAML file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Headed CSV file to read.
    pub input: PathBuf,
    /// Root of the output tree; files land in `<output_dir>/<keyspace>/<table>/`.
    pub output_dir: PathBuf,
    pub keyspace: String,
    pub table: String,
    /// Rows per record batch handed to the Parquet encoder.
    pub batch_rows: usize,
    pub compression: TableCompression,
    /// Abort once more than this many lines failed. `None` skips every bad line.
    pub max_errors: Option<u64>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            input: PathBuf::from("./newaa.csv"),
            output_dir: PathBuf::from("./data"),
            keyspace: "test_bulkloader".to_string(),
            table: "target_history".to_string(),
            batch_rows: 8192,
            compression: TableCompression::Snappy,
            max_errors: None,
        }
    }
}

impl LoadConfig {
    /// Load a YAML config file on top of the defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_rows == 0 {
            bail!("batch_rows must be greater than 0");
        }
        if self.batch_rows > 1_000_000 {
            warn!(
                batch_rows = self.batch_rows,
                "batch_rows is very large; may cause memory issues"
            );
        }
        if self.input.as_os_str().is_empty() {
            bail!("input path must not be empty");
        }
        if self.output_dir.as_os_str().is_empty() {
            bail!("output_dir must not be empty");
        }
        self.table_schema()
            .validate()
            .context("invalid destination table")?;
        Ok(())
    }

    pub fn table_schema(&self) -> TableSchema {
        TableSchema::target_history(&self.keyspace, &self.table)
    }

    /// `<output_dir>/<keyspace>/<table>`
    pub fn table_dir(&self) -> PathBuf {
        self.output_dir.join(&self.keyspace).join(&self.table)
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            batch_rows: self.batch_rows,
            compression: self.compression,
        }
    }
}
