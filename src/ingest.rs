// src/ingest.rs

use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::io::Read;
use thiserror::Error;

use crate::convert::{convert_record, ConvertError};
use crate::record::TargetHistoryRecord;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The line was read but could not be turned into a record.
    #[error("line {line}: {source}")]
    Convert {
        line: u64,
        #[source]
        source: ConvertError,
    },

    /// The CSV layer failed (I/O or invalid UTF-8).
    #[error("line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
}

impl IngestError {
    pub fn line(&self) -> u64 {
        match self {
            IngestError::Convert { line, .. } | IngestError::Csv { line, .. } => *line,
        }
    }
}

/// Lazy stream of records from a headed CSV source, one item per data line,
/// in input order.
///
/// Rows of any width are handed to the converter so that a wrong field
/// count surfaces as a schema error for that line only. The stream ends
/// after the first I/O error, since the underlying source is no longer
/// readable.
pub struct TargetHistoryReader<R> {
    records: StringRecordsIntoIter<R>,
    last_line: u64,
    done: bool,
}

impl<R: Read> TargetHistoryReader<R> {
    pub fn new(source: R) -> Self {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);
        Self {
            records: rdr.into_records(),
            // the header occupies line 1
            last_line: 1,
            done: false,
        }
    }
}

impl<R: Read> Iterator for TargetHistoryReader<R> {
    type Item = Result<TargetHistoryRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.records.next()? {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(self.last_line + 1);
                self.last_line = line;
                Some(convert_record(&record).map_err(|source| IngestError::Convert { line, source }))
            }
            Err(source) => {
                let line = source
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(self.last_line + 1);
                self.last_line = line;
                if source.is_io_error() {
                    self.done = true;
                }
                Some(Err(IngestError::Csv { line, source }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    const HEADER: &str = "unique_id,acquisition_time,target_type,data_source,status,longitude,latitude,speed,conversion,add1,add2,cog,true_head,power,extend\n";

    #[test]
    fn skips_header_and_keeps_order() {
        let data = format!(
            "{HEADER}A1,2020-01-01,1,2,0,120.5,30.2,5.5,1.2,0.3,4,10,20,,ext\n\
             A2,2020-01-02,1,2,0,120.5,30.2,5.5,1.2,0.3,4,10,20,9,ext\n"
        );
        let rows: Vec<_> = TargetHistoryReader::new(Cursor::new(data))
            .collect::<Result<_, _>>()
            .unwrap();

        let ids: Vec<&str> = rows.iter().map(|r: &TargetHistoryRecord| r.unique_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2"]);
        assert_eq!(rows[1].power, Some(9));
    }

    #[test]
    fn bad_lines_do_not_stop_the_stream() {
        let data = format!(
            "{HEADER}A1,2020-01-01,abc,2,0,120.5,30.2,5.5,1.2,0.3,4,10,20,,ext\n\
             A2,2020-01-02,1,2\n\
             A3,2020-01-03,1,2,0,120.5,30.2,5.5,1.2,0.3,4,10,20,,ext\n"
        );
        let items: Vec<_> = TargetHistoryReader::new(Cursor::new(data)).collect();
        assert_eq!(items.len(), 3);

        match &items[0] {
            Err(IngestError::Convert { line, source }) => {
                assert_eq!(*line, 2);
                assert!(!source.is_schema());
            }
            other => panic!("unexpected {:?}", other),
        }
        match &items[1] {
            Err(IngestError::Convert { line, source }) => {
                assert_eq!(*line, 3);
                assert!(source.is_schema());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(items[2].as_ref().unwrap().unique_id, "A3");
    }

    #[test]
    fn quoted_fields_are_unwrapped() {
        let data = format!(
            "{HEADER}\"A,1\",2020-01-01,1,2,0,\"120.5\",30.2,5.5,1.2,0.3,4,10,20,,\"ext\"\n"
        );
        let rec = TargetHistoryReader::new(Cursor::new(data))
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(rec.unique_id, "A,1");
        assert_eq!(rec.longitude, "120.5");
    }

    #[test]
    fn header_only_yields_nothing() {
        assert_eq!(TargetHistoryReader::new(Cursor::new(HEADER)).count(), 0);
    }

    struct FailingSource;

    impl Read for FailingSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    #[test]
    fn io_error_ends_the_stream() {
        let items: Vec<_> = TargetHistoryReader::new(FailingSource).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(IngestError::Csv { .. })));
    }
}
