use anyhow::Result;
use bulkload::{
    config::LoadConfig,
    load::{load_rows, run},
    writer::{read_table, table_metadata, TableCompression, TableWriter, WriteSummary, WriterError},
    TargetHistoryReader, TargetHistoryRecord,
};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use tempfile::tempdir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const HEADER: &str = "unique_id,acquisition_time,target_type,data_source,status,longitude,latitude,speed,conversion,add1,add2,cog,true_head,power,extend";
const SAMPLE: &str = "A1,2020-01-01,1,2,0,120.5,30.2,5.5,1.2,0.3,4,10,20,,ext";

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Keeps every submitted row in memory.
#[derive(Default)]
struct CollectingWriter {
    rows: Vec<TargetHistoryRecord>,
}

impl TableWriter for CollectingWriter {
    fn add_row(&mut self, record: &TargetHistoryRecord) -> Result<(), WriterError> {
        self.rows.push(record.clone());
        Ok(())
    }

    fn close(self) -> Result<WriteSummary, WriterError> {
        Ok(WriteSummary {
            rows: self.rows.len() as u64,
            ..WriteSummary::default()
        })
    }
}

/// Rejects rows whose id is listed.
struct RejectingWriter {
    reject: &'static str,
    accepted: usize,
}

impl TableWriter for RejectingWriter {
    fn add_row(&mut self, record: &TargetHistoryRecord) -> Result<(), WriterError> {
        if record.unique_id == self.reject {
            return Err(WriterError::Io {
                path: "memory".into(),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.accepted += 1;
        Ok(())
    }

    fn close(self) -> Result<WriteSummary, WriterError> {
        Ok(WriteSummary::default())
    }
}

/// Buffers rows in fixed-size batches and fails any batch holding the poisoned id.
struct BatchingWriter {
    batch: usize,
    poison: &'static str,
    pending: Vec<TargetHistoryRecord>,
    persisted: Vec<TargetHistoryRecord>,
}

impl TableWriter for BatchingWriter {
    fn add_row(&mut self, record: &TargetHistoryRecord) -> Result<(), WriterError> {
        self.pending.push(record.clone());
        if self.pending.len() < self.batch {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        if batch.iter().any(|r| r.unique_id == self.poison) {
            return Err(WriterError::BatchLost {
                rows: batch.len() as u64,
                source: Box::new(WriterError::Io {
                    path: "memory".into(),
                    source: io::Error::new(io::ErrorKind::Other, "sink closed"),
                }),
            });
        }
        self.persisted.extend(batch);
        Ok(())
    }

    fn close(mut self) -> Result<WriteSummary, WriterError> {
        self.persisted.append(&mut self.pending);
        Ok(WriteSummary {
            rows: self.persisted.len() as u64,
            ..WriteSummary::default()
        })
    }
}

fn csv_with_rows(n: usize) -> String {
    let mut out = format!("{HEADER}\n");
    for i in 0..n {
        writeln!(
            out,
            "T{i},2020-01-01 00:{:02}:00,1,2,0,120.5,30.2,{i}.5,1.2,0.3,4,10,20,{},ext",
            i % 60,
            if i % 3 == 0 { String::new() } else { i.to_string() }
        )
        .unwrap();
    }
    out
}

#[test]
fn sample_line_is_submitted_as_typed_record() -> Result<()> {
    init_test_logging();
    let data = format!("{HEADER}\n{SAMPLE}\n");
    let mut writer = CollectingWriter::default();

    let stats = load_rows(TargetHistoryReader::new(Cursor::new(data)), &mut writer, None)?;

    assert_eq!(stats.submitted, 1);
    let rec = &writer.rows[0];
    assert_eq!(rec.unique_id, "A1");
    assert_eq!(rec.acquisition_time, "2020-01-01");
    assert_eq!((rec.target_type, rec.data_source, rec.status), (1, 2, 0));
    assert_eq!((rec.longitude.as_str(), rec.latitude.as_str()), ("120.5", "30.2"));
    assert_eq!((rec.speed, rec.conversion, rec.add1), (5.5, 1.2, 0.3));
    assert_eq!((rec.add2, rec.cog, rec.true_head), (4, 10, 20));
    assert_eq!(rec.power, None);
    assert_eq!(rec.extend, "ext");
    Ok(())
}

#[test]
fn malformed_line_is_skipped_and_counted() -> Result<()> {
    init_test_logging();
    let bad = SAMPLE.replacen(",1,2,0,", ",abc,2,0,", 1);
    let data = format!("{HEADER}\n{SAMPLE}\n{bad}\nB1,2020-01-02,1\n{SAMPLE}\n");
    let mut writer = CollectingWriter::default();

    let stats = load_rows(TargetHistoryReader::new(Cursor::new(data)), &mut writer, None)?;

    assert_eq!(stats.lines, 4);
    assert_eq!(stats.submitted, 2);
    assert_eq!(stats.parse_errors, 1);
    assert_eq!(stats.schema_errors, 1);
    assert_eq!(writer.rows.len(), 2);
    assert_eq!(writer.close()?.rows, 2);
    Ok(())
}

#[test]
fn hundred_lines_arrive_in_order() -> Result<()> {
    let mut writer = CollectingWriter::default();

    let stats = load_rows(
        TargetHistoryReader::new(Cursor::new(csv_with_rows(100))),
        &mut writer,
        None,
    )?;

    assert_eq!(stats.submitted, 100);
    assert_eq!(stats.failed(), 0);
    let ids: Vec<String> = writer.rows.iter().map(|r| r.unique_id.clone()).collect();
    let expected: Vec<String> = (0..100).map(|i| format!("T{i}")).collect();
    assert_eq!(ids, expected);
    Ok(())
}

#[test]
fn writer_rejections_do_not_stop_the_load() -> Result<()> {
    init_test_logging();
    let data = csv_with_rows(5);
    let mut writer = RejectingWriter {
        reject: "T2",
        accepted: 0,
    };

    let stats = load_rows(TargetHistoryReader::new(Cursor::new(data)), &mut writer, None)?;

    assert_eq!(stats.write_errors, 1);
    assert_eq!(stats.submitted, 4);
    assert_eq!(writer.accepted, 4);
    Ok(())
}

#[test]
fn lost_batch_moves_its_rows_out_of_submitted() -> Result<()> {
    init_test_logging();
    let mut writer = BatchingWriter {
        batch: 4,
        poison: "T5",
        pending: Vec::new(),
        persisted: Vec::new(),
    };

    let stats = load_rows(
        TargetHistoryReader::new(Cursor::new(csv_with_rows(10))),
        &mut writer,
        None,
    )?;

    assert_eq!(stats.lines, 10);
    assert_eq!(stats.write_errors, 4);
    assert_eq!(stats.submitted, 6);
    assert_eq!(writer.close()?.rows, stats.submitted);
    Ok(())
}

#[test]
fn lost_batch_counts_toward_max_errors() {
    let mut writer = BatchingWriter {
        batch: 4,
        poison: "T1",
        pending: Vec::new(),
        persisted: Vec::new(),
    };

    let res = load_rows(
        TargetHistoryReader::new(Cursor::new(csv_with_rows(10))),
        &mut writer,
        Some(3),
    );
    assert!(res.is_err());
}

#[test]
fn max_errors_aborts_the_load() {
    let bad = SAMPLE.replacen("5.5", "fast", 1);
    let data = format!("{HEADER}\n{bad}\n{bad}\n{SAMPLE}\n");
    let mut writer = CollectingWriter::default();

    let err = load_rows(TargetHistoryReader::new(Cursor::new(data)), &mut writer, Some(1))
        .unwrap_err();

    assert!(err.to_string().contains("max_errors"), "{err}");
    assert!(writer.rows.is_empty());
}

fn config_for(dir: &Path, input: &Path) -> LoadConfig {
    LoadConfig {
        input: input.to_path_buf(),
        output_dir: dir.join("data"),
        batch_rows: 16,
        compression: TableCompression::Snappy,
        ..LoadConfig::default()
    }
}

#[test]
fn run_writes_table_file_under_keyspace_and_table() -> Result<()> {
    init_test_logging();
    let dir = tempdir()?;
    let input = dir.path().join("newaa.csv");
    let bad = SAMPLE.replacen("A1,", "X9,", 1).replacen(",10,", ",ten,", 1);
    fs::write(&input, format!("{}{bad}\n", csv_with_rows(40)))?;

    let summary = run(&config_for(dir.path(), &input))?;

    assert_eq!(summary.stats.lines, 41);
    assert_eq!(summary.stats.submitted, 40);
    assert_eq!(summary.stats.parse_errors, 1);
    assert_eq!(summary.output.rows, 40);
    assert_eq!(summary.output.batches, 3);

    let path = summary.output.path.expect("table file written");
    assert_eq!(
        path.parent().unwrap(),
        dir.path().join("data").join("test_bulkloader").join("target_history")
    );

    let rows = read_table(&path)?;
    assert_eq!(rows.len(), 40);
    assert_eq!(rows[0].unique_id, "T0");
    assert_eq!(rows[0].power, None);
    assert_eq!(rows[1].power, Some(1));
    assert_eq!(rows[39].unique_id, "T39");

    let info = table_metadata(&path)?;
    assert_eq!(info.keyspace.as_deref(), Some("test_bulkloader"));
    assert_eq!(info.table.as_deref(), Some("target_history"));
    assert_eq!(info.rows, 40);
    Ok(())
}

#[test]
fn aborted_run_publishes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("bad.csv");
    let bad = SAMPLE.replacen("A1,", "A1,2020-01-01,", 1);
    fs::write(&input, format!("{HEADER}\n{SAMPLE}\n{bad}\n{bad}\n"))?;

    let config = LoadConfig {
        max_errors: Some(1),
        ..config_for(dir.path(), &input)
    };
    assert!(run(&config).is_err());

    let table_dir = config.table_dir();
    assert_eq!(fs::read_dir(&table_dir)?.count(), 0);
    Ok(())
}

#[test]
fn missing_input_fails_the_run() -> Result<()> {
    let dir = tempdir()?;
    let config = config_for(dir.path(), &dir.path().join("absent.csv"));

    let err = run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"), "{err:#}");
    Ok(())
}
