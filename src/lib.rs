pub mod config;
pub mod convert;
pub mod ingest;
pub mod load;
pub mod record;
pub mod schema;
pub mod writer;

pub use config::LoadConfig;
pub use convert::{convert_fields, convert_record, ConvertError};
pub use ingest::{IngestError, TargetHistoryReader};
pub use load::{load_rows, run, LoadStats, LoadSummary};
pub use record::TargetHistoryRecord;
pub use schema::TableSchema;
pub use writer::{ParquetTableWriter, TableWriter, WriteSummary, WriterError};
