// src/record.rs

use serde::{Deserialize, Serialize};

/// Column names of `target_history`, in submission order.
pub const COLUMNS: [&str; 15] = [
    "unique_id",
    "acquisition_time",
    "target_type",
    "data_source",
    "status",
    "longitude",
    "latitude",
    "speed",
    "conversion",
    "add1",
    "add2",
    "cog",
    "true_head",
    "power",
    "extend",
];

/// Columns forming the composite key.
pub const PRIMARY_KEY: [&str; 2] = ["unique_id", "acquisition_time"];

/// One observation of a tracked target.
///
/// `(unique_id, acquisition_time)` identifies the record. Longitude and
/// latitude are kept as the text they arrived in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetHistoryRecord {
    pub unique_id: String,
    pub acquisition_time: String,
    pub target_type: i32,
    pub data_source: i32,
    pub status: i32,
    pub longitude: String,
    pub latitude: String,
    pub speed: f64,
    pub conversion: f64,
    pub add1: f64,
    pub add2: i32,
    pub cog: i32,
    pub true_head: i32,
    pub power: Option<i32>,
    pub extend: String,
}

impl TargetHistoryRecord {
    pub fn key(&self) -> (&str, &str) {
        (&self.unique_id, &self.acquisition_time)
    }
}
