//! Immutable dataset snapshot

use crate::DatasetError;
use chrono::Datelike;
use csv::{ByteRecord, StringRecord};
use series_normalizer::{parse_timestamp, VariableKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PERIOD_END_COLUMN: &str = "period_end";
const CITY_COLUMNS: [&str; 2] = ["city_id", "city"];

/// One observation row as read from the CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    /// Period-end timestamp, verbatim
    pub period_end: String,
    /// City identifier, verbatim (empty when the column is absent)
    pub city_id: String,
    /// Raw target fields, verbatim
    pub values: BTreeMap<VariableKind, String>,
}

/// A raw record plus the calendar fields derived at load time.
///
/// `year`/`month` are `None` when the timestamp did not parse; such a record
/// never matches a year or month filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedRecord {
    pub record: RawRecord,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl IndexedRecord {
    /// Index a raw record by its parsed period end (UTC)
    pub fn index(record: RawRecord) -> Self {
        let (year, month) = match parse_timestamp(&record.period_end) {
            Ok(ts) => (Some(ts.year()), Some(ts.month())),
            Err(e) => {
                debug!("Unmatchable record: {}", e);
                (None, None)
            }
        };
        Self {
            record,
            year,
            month,
        }
    }
}

/// Column positions resolved from the CSV header
struct ColumnMapping {
    period_end: usize,
    city: Option<usize>,
    targets: Vec<(VariableKind, usize)>,
}

impl ColumnMapping {
    fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &str| -> Option<usize> {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let period_end = find(PERIOD_END_COLUMN).ok_or_else(|| {
            DatasetError::InvalidFormat(format!("missing required column '{PERIOD_END_COLUMN}'"))
        })?;
        let city = CITY_COLUMNS.into_iter().find_map(|c| find(c));
        let targets: Vec<_> = VariableKind::ALL
            .iter()
            .filter_map(|kind| find(kind.column()).map(|idx| (*kind, idx)))
            .collect();

        if city.is_none() {
            warn!("Dataset has no city column; city filters will match nothing");
        }
        if targets.is_empty() {
            warn!("Dataset has no target columns (dni, ghi, dhi, pv)");
        }

        Ok(Self {
            period_end,
            city,
            targets,
        })
    }

    /// Extract a row; invalid UTF-8 is replaced rather than failing the load
    fn extract(&self, row: &ByteRecord) -> RawRecord {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        let field = |idx: usize| row.get(idx).map(text).unwrap_or_default();
        RawRecord {
            period_end: field(self.period_end),
            city_id: self.city.map(field).unwrap_or_default(),
            values: self
                .targets
                .iter()
                .filter_map(|(kind, idx)| row.get(*idx).map(|v| (*kind, text(v))))
                .collect(),
        }
    }
}

/// The in-memory dataset, immutable after load
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<IndexedRecord>,
    source: Option<PathBuf>,
}

impl Dataset {
    /// Load the dataset from a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        info!("Loading dataset from {}", path.display());

        let file = File::open(path).map_err(|source| DatasetError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut dataset = Self::from_reader(file)?;
        dataset.source = Some(path.to_path_buf());
        Ok(dataset)
    }

    /// Build a snapshot from any CSV reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mapping = ColumnMapping::from_headers(reader.headers()?)?;

        let mut records = Vec::new();
        let mut lossy = 0usize;
        let mut row = ByteRecord::new();
        while reader.read_byte_record(&mut row)? {
            if std::str::from_utf8(row.as_slice()).is_err() {
                lossy += 1;
            }
            records.push(IndexedRecord::index(mapping.extract(&row)));
        }

        if lossy > 0 {
            warn!("{} dataset rows contained invalid UTF-8; bad bytes replaced", lossy);
        }
        let unmatchable = records.iter().filter(|r| r.year.is_none()).count();
        info!(
            "Dataset loaded: {} records ({} with unparseable timestamps)",
            records.len(),
            unmatchable
        );

        Ok(Self::from_records(records))
    }

    /// Build a snapshot from already-indexed records
    pub fn from_records(records: Vec<IndexedRecord>) -> Self {
        Self {
            records,
            source: None,
        }
    }

    pub fn records(&self) -> &[IndexedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// File the snapshot was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
period_end,city_id,ghi,dni,dhi,pv
2023-01-01T00:30:00+00:00,1,10,20,5,100
2022-12-31T23:30:00Z,1,12,22,6,110
not-a-date,2,1,2,3,4
";

    #[test]
    fn test_load_derives_year_and_month() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let first = &dataset.records()[0];
        assert_eq!(first.year, Some(2023));
        assert_eq!(first.month, Some(1));
        assert_eq!(first.record.city_id, "1");
        assert_eq!(first.record.values[&VariableKind::Ghi], "10");
        assert_eq!(first.record.values[&VariableKind::Pv], "100");

        let second = &dataset.records()[1];
        assert_eq!((second.year, second.month), (Some(2022), Some(12)));
    }

    #[test]
    fn test_unparseable_timestamp_is_kept_but_unmatchable() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let bad = &dataset.records()[2];
        assert_eq!(bad.year, None);
        assert_eq!(bad.month, None);
        assert_eq!(bad.record.period_end, "not-a-date");
    }

    #[test]
    fn test_invalid_utf8_row_does_not_abort_load() {
        let mut csv = b"period_end,city_id,ghi\n2023-01-01T00:00:00Z,1,10\n".to_vec();
        csv.extend_from_slice(b"2023-01-02T00:00:00Z,\xff\xfe,20\n");
        csv.extend_from_slice(b"2023-01-03T00:00:00Z,1,30\n");

        let dataset = Dataset::from_reader(csv.as_slice()).unwrap();
        assert_eq!(dataset.len(), 3);

        let bad = &dataset.records()[1];
        assert_eq!(bad.record.city_id, "\u{fffd}\u{fffd}");
        assert_eq!(bad.record.values[&VariableKind::Ghi], "20");
        assert_eq!(bad.year, Some(2023));
        assert_eq!(dataset.records()[2].record.values[&VariableKind::Ghi], "30");
    }

    #[test]
    fn test_missing_period_end_column() {
        let err = Dataset::from_reader("time,ghi\n2023-01-01,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidFormat(_)));
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = Dataset::load("/nonexistent/solar/data.csv").unwrap_err();
        assert!(matches!(err, DatasetError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_load_from_path_and_partial_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Period_End,city,GHI\n2023-06-15T10:00:00,3,450\n").unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset.source(), Some(file.path()));

        let record = &dataset.records()[0];
        assert_eq!(record.record.city_id, "3");
        assert_eq!(record.month, Some(6));
        assert!(!record.record.values.contains_key(&VariableKind::Dni));
    }
}
