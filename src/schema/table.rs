// src/schema/table.rs

use anyhow::{bail, Result};
use arrow::datatypes::Schema as ArrowSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::arrow::build_arrow_schema;
use super::types::{Column, ColumnType};
use crate::record::{COLUMNS, PRIMARY_KEY};

/// Destination table: the keyspace/table pair plus its columns and key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// The `target_history` layout under the given keyspace/table names.
    pub fn target_history(keyspace: &str, table: &str) -> Self {
        use ColumnType::*;

        let columns = vec![
            Column::new("unique_id", Varchar),
            Column::new("acquisition_time", Varchar),
            Column::new("target_type", Int),
            Column::new("data_source", Int),
            Column::new("status", Int),
            Column::new("longitude", Varchar),
            Column::new("latitude", Varchar),
            Column::new("speed", Double),
            Column::new("conversion", Double),
            Column::new("add1", Double),
            Column::new("add2", Int),
            Column::new("cog", Int),
            Column::new("true_head", Int),
            Column::new("power", Int).nullable(),
            Column::new("extend", Varchar),
        ];

        TableSchema {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            columns,
            primary_key: PRIMARY_KEY.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `keyspace.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.table)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Check the descriptor against the record layout before any row is read.
    pub fn validate(&self) -> Result<()> {
        check_identifier("keyspace", &self.keyspace)?;
        check_identifier("table", &self.table)?;

        let mut seen = HashSet::new();
        for col in &self.columns {
            check_identifier("column", &col.name)?;
            if !seen.insert(col.name.as_str()) {
                bail!("duplicate column `{}` in {}", col.name, self.qualified_name());
            }
        }

        let names = self.column_names();
        if names != COLUMNS {
            bail!(
                "{} declares columns {:?}, records carry {:?}",
                self.qualified_name(),
                names,
                COLUMNS
            );
        }

        if self.primary_key.is_empty() {
            bail!("{} has no primary key", self.qualified_name());
        }
        for key in &self.primary_key {
            match self.columns.iter().find(|c| &c.name == key) {
                None => bail!("primary key column `{}` is not declared", key),
                Some(col) if col.nullable => {
                    bail!("primary key column `{}` must not be nullable", key)
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    pub fn arrow_schema(&self) -> Arc<ArrowSchema> {
        build_arrow_schema(&self.columns)
    }

    /// `CREATE TABLE ks.tbl (...)` for this descriptor.
    pub fn create_statement(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.ty.as_cql()))
            .collect();
        format!(
            "CREATE TABLE {} ({}, primary key({}))",
            self.qualified_name(),
            cols.join(", "),
            self.primary_key.join(",")
        )
    }

    /// `INSERT INTO ks.tbl (...) VALUES (?, ...)` for this descriptor.
    pub fn insert_statement(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()];
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualified_name(),
            self.column_names().join(", "),
            placeholders.join(", ")
        )
    }
}

fn check_identifier(what: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        bail!("invalid {} name `{}`", what, name);
    }
    Ok(())
}
