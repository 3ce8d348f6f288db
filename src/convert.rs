// src/convert.rs

use csv::StringRecord;
use std::str::FromStr;
use thiserror::Error;

use crate::record::{TargetHistoryRecord, COLUMNS};

/// Number of fields every data line must carry.
pub const FIELD_COUNT: usize = COLUMNS.len();

/// Index of `power`, the one column allowed to be empty.
const NULLABLE_INDEX: usize = 13;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("expected {expected} fields, found {found}")]
    Schema { expected: usize, found: usize },

    #[error("field {index} ({column}) = {value:?}: {reason}")]
    Parse {
        index: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
}

impl ConvertError {
    pub fn is_schema(&self) -> bool {
        matches!(self, ConvertError::Schema { .. })
    }
}

/// Convert one CSV record into a `TargetHistoryRecord`.
pub fn convert_record(record: &StringRecord) -> Result<TargetHistoryRecord, ConvertError> {
    let fields: Vec<&str> = record.iter().collect();
    convert_fields(&fields)
}

/// Coerce 15 ordered string fields into a typed record.
///
/// Text and integer fields are taken as-is; double fields may carry
/// surrounding whitespace or control characters. Every field must be
/// non-empty except `power`, where an empty field becomes `None`.
pub fn convert_fields<S: AsRef<str>>(fields: &[S]) -> Result<TargetHistoryRecord, ConvertError> {
    if fields.len() != FIELD_COUNT {
        return Err(ConvertError::Schema {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }
    let f = |i: usize| fields[i].as_ref();

    Ok(TargetHistoryRecord {
        unique_id: text(0, f(0))?,
        acquisition_time: text(1, f(1))?,
        target_type: number(2, f(2))?,
        data_source: number(3, f(3))?,
        status: number(4, f(4))?,
        longitude: text(5, f(5))?,
        latitude: text(6, f(6))?,
        speed: double(7, f(7))?,
        conversion: double(8, f(8))?,
        add1: double(9, f(9))?,
        add2: number(10, f(10))?,
        cog: number(11, f(11))?,
        true_head: number(12, f(12))?,
        power: optional_number(NULLABLE_INDEX, f(NULLABLE_INDEX))?,
        extend: text(14, f(14))?,
    })
}

fn parse_error(index: usize, value: &str, reason: impl ToString) -> ConvertError {
    ConvertError::Parse {
        index,
        column: COLUMNS[index],
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn text(index: usize, raw: &str) -> Result<String, ConvertError> {
    if raw.is_empty() {
        return Err(parse_error(index, raw, "empty field"));
    }
    Ok(raw.to_string())
}

fn number<T>(index: usize, raw: &str) -> Result<T, ConvertError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if raw.is_empty() {
        return Err(parse_error(index, raw, "empty field"));
    }
    raw.parse::<T>().map_err(|e| parse_error(index, raw, e))
}

/// Doubles ignore padding of ASCII whitespace and control characters.
fn double(index: usize, raw: &str) -> Result<f64, ConvertError> {
    let trimmed = raw.trim_matches(|c: char| c <= ' ');
    if trimmed.is_empty() {
        return Err(parse_error(index, raw, "empty field"));
    }
    trimmed.parse::<f64>().map_err(|e| parse_error(index, raw, e))
}

fn optional_number<T>(index: usize, raw: &str) -> Result<Option<T>, ConvertError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if raw.is_empty() {
        return Ok(None);
    }
    number(index, raw).map(Some)
}
