pub mod arrow;
pub mod table;
pub mod types;

pub use arrow::{build_arrow_schema, map_to_arrow_type};
pub use table::TableSchema;
pub use types::{Column, ColumnType};
