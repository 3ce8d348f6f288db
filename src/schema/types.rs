// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Column types understood by the table writer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Varchar,
    Int,
    Double,
}

impl ColumnType {
    /// CQL spelling, used when rendering statements.
    pub fn as_cql(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "varchar",
            ColumnType::Int => "int",
            ColumnType::Double => "double",
        }
    }
}

/// A single column definition of a destination table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: &str, ty: ColumnType) -> Self {
        Column {
            name: name.to_string(),
            ty,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}
