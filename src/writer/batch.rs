// src/writer/batch.rs

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{
        Array, ArrayRef, Float64Array, Float64Builder, Int32Array, Int32Builder, StringArray,
        StringBuilder,
    },
    datatypes::Schema as ArrowSchema,
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::record::TargetHistoryRecord;

/// Column builders for `TargetHistoryRecord`, in table column order.
#[derive(Default)]
pub struct RecordBuilders {
    unique_id: StringBuilder,
    acquisition_time: StringBuilder,
    target_type: Int32Builder,
    data_source: Int32Builder,
    status: Int32Builder,
    longitude: StringBuilder,
    latitude: StringBuilder,
    speed: Float64Builder,
    conversion: Float64Builder,
    add1: Float64Builder,
    add2: Int32Builder,
    cog: Int32Builder,
    true_head: Int32Builder,
    power: Int32Builder,
    extend: StringBuilder,
    rows: usize,
}

impl RecordBuilders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn append(&mut self, rec: &TargetHistoryRecord) {
        self.unique_id.append_value(&rec.unique_id);
        self.acquisition_time.append_value(&rec.acquisition_time);
        self.target_type.append_value(rec.target_type);
        self.data_source.append_value(rec.data_source);
        self.status.append_value(rec.status);
        self.longitude.append_value(&rec.longitude);
        self.latitude.append_value(&rec.latitude);
        self.speed.append_value(rec.speed);
        self.conversion.append_value(rec.conversion);
        self.add1.append_value(rec.add1);
        self.add2.append_value(rec.add2);
        self.cog.append_value(rec.cog);
        self.true_head.append_value(rec.true_head);
        self.power.append_option(rec.power);
        self.extend.append_value(&rec.extend);
        self.rows += 1;
    }

    /// Drain the buffered rows into a batch; the builders are left empty.
    pub fn finish(&mut self, schema: Arc<ArrowSchema>) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.unique_id.finish()),
            Arc::new(self.acquisition_time.finish()),
            Arc::new(self.target_type.finish()),
            Arc::new(self.data_source.finish()),
            Arc::new(self.status.finish()),
            Arc::new(self.longitude.finish()),
            Arc::new(self.latitude.finish()),
            Arc::new(self.speed.finish()),
            Arc::new(self.conversion.finish()),
            Arc::new(self.add1.finish()),
            Arc::new(self.add2.finish()),
            Arc::new(self.cog.finish()),
            Arc::new(self.true_head.finish()),
            Arc::new(self.power.finish()),
            Arc::new(self.extend.finish()),
        ];
        self.rows = 0;
        RecordBatch::try_new(schema, columns)
    }
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column `{}` missing from batch", name))?;
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        anyhow!(
            "column `{}` has unexpected type {:?}",
            name,
            col.data_type()
        )
    })
}

fn required<T>(value: Option<T>, name: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| anyhow!("null `{}` at row {}", name, row))
}

/// Turn a batch read back from a table file into records.
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<TargetHistoryRecord>> {
    let unique_id = column::<StringArray>(batch, "unique_id")?;
    let acquisition_time = column::<StringArray>(batch, "acquisition_time")?;
    let target_type = column::<Int32Array>(batch, "target_type")?;
    let data_source = column::<Int32Array>(batch, "data_source")?;
    let status = column::<Int32Array>(batch, "status")?;
    let longitude = column::<StringArray>(batch, "longitude")?;
    let latitude = column::<StringArray>(batch, "latitude")?;
    let speed = column::<Float64Array>(batch, "speed")?;
    let conversion = column::<Float64Array>(batch, "conversion")?;
    let add1 = column::<Float64Array>(batch, "add1")?;
    let add2 = column::<Int32Array>(batch, "add2")?;
    let cog = column::<Int32Array>(batch, "cog")?;
    let true_head = column::<Int32Array>(batch, "true_head")?;
    let power = column::<Int32Array>(batch, "power")?;
    let extend = column::<StringArray>(batch, "extend")?;

    let text = |arr: &StringArray, name: &str, row: usize| -> Result<String> {
        let v = if arr.is_null(row) { None } else { Some(arr.value(row)) };
        required(v, name, row).map(str::to_string)
    };
    let int = |arr: &Int32Array, name: &str, row: usize| -> Result<i32> {
        let v = if arr.is_null(row) { None } else { Some(arr.value(row)) };
        required(v, name, row)
    };
    let double = |arr: &Float64Array, name: &str, row: usize| -> Result<f64> {
        let v = if arr.is_null(row) { None } else { Some(arr.value(row)) };
        required(v, name, row)
    };

    (0..batch.num_rows())
        .map(|row| {
            Ok(TargetHistoryRecord {
                unique_id: text(unique_id, "unique_id", row)?,
                acquisition_time: text(acquisition_time, "acquisition_time", row)?,
                target_type: int(target_type, "target_type", row)?,
                data_source: int(data_source, "data_source", row)?,
                status: int(status, "status", row)?,
                longitude: text(longitude, "longitude", row)?,
                latitude: text(latitude, "latitude", row)?,
                speed: double(speed, "speed", row)?,
                conversion: double(conversion, "conversion", row)?,
                add1: double(add1, "add1", row)?,
                add2: int(add2, "add2", row)?,
                cog: int(cog, "cog", row)?,
                true_head: int(true_head, "true_head", row)?,
                power: if power.is_null(row) {
                    None
                } else {
                    Some(power.value(row))
                },
                extend: text(extend, "extend", row)?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .context("decoding target_history batch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;

    fn record(id: &str, power: Option<i32>) -> TargetHistoryRecord {
        TargetHistoryRecord {
            unique_id: id.into(),
            acquisition_time: "2020-01-01".into(),
            target_type: 1,
            data_source: 2,
            status: 0,
            longitude: "120.5".into(),
            latitude: "30.2".into(),
            speed: 5.5,
            conversion: 1.2,
            add1: 0.3,
            add2: 4,
            cog: 10,
            true_head: 20,
            power,
            extend: "ext".into(),
        }
    }

    #[test]
    fn builders_produce_schema_conformant_batch() -> Result<()> {
        let schema = TableSchema::target_history("ks", "tbl").arrow_schema();
        let mut builders = RecordBuilders::new();
        let input = vec![record("A1", None), record("A2", Some(3))];
        for r in &input {
            builders.append(r);
        }
        assert_eq!(builders.len(), 2);

        let batch = builders.finish(schema)?;
        assert!(builders.is_empty());
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column_by_name("power").unwrap().null_count(), 1);

        assert_eq!(records_from_batch(&batch)?, input);
        Ok(())
    }
}
