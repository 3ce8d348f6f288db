// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::{Column, ColumnType};

/// Map a table column type into an Arrow DataType.
///
/// - varchar → Utf8
/// - int     → Int32
/// - double  → Float64
pub fn map_to_arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::Varchar => DataType::Utf8,
        ColumnType::Int => DataType::Int32,
        ColumnType::Double => DataType::Float64,
    }
}

/// Build an ArrowSchema (inside an Arc) from a slice of `Column`s, keeping
/// each column's nullability.
pub fn build_arrow_schema(cols: &[Column]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col.ty), col.nullable))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullability_follows_columns() {
        let cols = vec![
            Column::new("unique_id", ColumnType::Varchar),
            Column::new("power", ColumnType::Int).nullable(),
        ];
        let schema = build_arrow_schema(&cols);

        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert!(!schema.field(0).is_nullable());
        assert_eq!(schema.field(1).data_type(), &DataType::Int32);
        assert!(schema.field(1).is_nullable());
    }
}
