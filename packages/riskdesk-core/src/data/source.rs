//! Price source interface and the CSV-backed implementation.

use crate::types::{RawPrices, Row};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// What to load: instruments and an optional inclusive date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    /// Instrument identifiers; empty means every available instrument
    pub instruments: Vec<String>,
    /// First date to include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// Last date to include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl PriceRequest {
    /// Request the given instruments over all available dates.
    pub fn new(instruments: Vec<String>) -> Self {
        Self {
            instruments,
            ..Default::default()
        }
    }

    /// Restrict to dates on or after `start`.
    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Restrict to dates on or before `end`.
    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Supplier of raw price observations.
///
/// A source may return fewer dates or instruments than requested and may leave gaps;
/// cleaning is the caller's job.
pub trait PriceSource {
    /// Load prices for the request.
    fn fetch(&self, request: &PriceRequest) -> Result<RawPrices>;
}

/// Price source backed by a CSV file.
///
/// Layout: a header row `date,<instrument>,...`, then one row per date with `YYYY-MM-DD`
/// dates. Empty cells (and `NaN`) are missing values.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    /// Create a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(&self, request: &PriceRequest) -> Result<RawPrices> {
        let file = File::open(&self.path)?;
        let all = read_prices(file)?;
        let selected = select(&all, request)?;

        tracing::info!(
            "Loaded {} rows for {} instruments from {}",
            selected.len(),
            selected.columns().len(),
            self.path.display()
        );
        Ok(selected)
    }
}

/// Read a price CSV into raw prices.
pub fn read_prices<R: Read>(reader: R) -> Result<RawPrices> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();
    let mut raw = RawPrices::new(columns)?;

    for record in reader.records() {
        let record = record?;
        let Some(date_field) = record.get(0) else {
            continue;
        };
        let date = parse_date(date_field)?;
        let values = record
            .iter()
            .skip(1)
            .zip(raw.columns())
            .map(|(field, column)| parse_price(field, column, date))
            .collect::<Result<Vec<_>>>()?;
        raw.push_row(date, values)?;
    }

    Ok(raw)
}

fn parse_date(field: &str) -> Result<NaiveDate> {
    // accept timestamps such as "2024-01-02 00:00:00" by keeping the date part
    let day = field.split([' ', 'T']).next().unwrap_or(field);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| Error::InvalidDate(format!("'{}': {}", field, e)))
}

fn parse_price(field: &str, column: &str, date: NaiveDate) -> Result<Option<f64>> {
    if field.is_empty() {
        return Ok(None);
    }
    let value: f64 = field.parse().map_err(|_| {
        Error::InvalidNumber(format!("'{}' for {} on {}", field, column, date))
    })?;
    Ok(Some(value).filter(|v| v.is_finite()))
}

fn select(all: &RawPrices, request: &PriceRequest) -> Result<RawPrices> {
    let indices: Vec<usize> = if request.instruments.is_empty() {
        (0..all.columns().len()).collect()
    } else {
        let mut requested = HashSet::with_capacity(request.instruments.len());
        request
            .instruments
            .iter()
            .filter(|id| {
                let first = requested.insert(id.as_str());
                if !first {
                    tracing::debug!("Instrument {} requested more than once", id);
                }
                first
            })
            .filter_map(|id| {
                let found = all.columns().iter().position(|c| c == id);
                if found.is_none() {
                    tracing::warn!("Instrument {} not available from source", id);
                }
                found
            })
            .collect()
    };

    let columns = indices.iter().map(|&i| all.columns()[i].clone()).collect();
    let rows = all
        .rows()
        .iter()
        .filter(|r| request.contains(r.date))
        .map(|r| Row::new(r.date, indices.iter().map(|&i| r.values[i]).collect()))
        .collect();

    RawPrices::from_rows(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CSV: &str = "\
Date,AAPL,MSFT,GOOGL
2024-01-03,101.0,,140.5
2024-01-02,100.0,370.0,NaN
2024-01-04 00:00:00,102.5,372.0,141.0
";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_read_prices() {
        let raw = read_prices(CSV.as_bytes()).unwrap();
        assert_eq!(raw.columns(), &["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(raw.len(), 3);
        // arrival order is preserved
        assert_eq!(raw.rows()[0].date, day(3));
        assert_eq!(raw.rows()[0].values, vec![Some(101.0), None, Some(140.5)]);
        assert_eq!(raw.rows()[1].values[2], None);
        assert_eq!(raw.rows()[2].date, day(4));
    }

    #[test]
    fn test_read_prices_rejects_bad_cells() {
        let bad_number = "date,A\n2024-01-02,abc\n";
        assert!(matches!(
            read_prices(bad_number.as_bytes()),
            Err(Error::InvalidNumber(_))
        ));

        let bad_date = "date,A\n01/02/2024,1.0\n";
        assert!(matches!(
            read_prices(bad_date.as_bytes()),
            Err(Error::InvalidDate(_))
        ));

        let duplicate = "date,A\n2024-01-02,1.0\n2024-01-02,2.0\n";
        assert!(matches!(
            read_prices(duplicate.as_bytes()),
            Err(Error::DuplicateDate(_))
        ));
    }

    #[test]
    fn test_csv_source_filters_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, CSV).unwrap();

        let source = CsvPriceSource::new(&path);
        let request = PriceRequest::new(vec!["GOOGL".into(), "TSLA".into(), "AAPL".into()])
            .with_start(day(3));
        let raw = source.fetch(&request).unwrap();

        // unknown instruments are skipped, requested order is kept
        assert_eq!(raw.columns(), &["GOOGL", "AAPL"]);
        assert_eq!(raw.len(), 2);
        assert!(raw.rows().iter().all(|r| r.date >= day(3)));
        assert_eq!(raw.rows()[0].values, vec![Some(140.5), Some(101.0)]);
    }

    #[test]
    fn test_read_prices_rejects_repeated_header() {
        let repeated = "date,A,A\n2024-01-01,100,100\n2024-01-02,50,110\n";
        assert!(matches!(
            read_prices(repeated.as_bytes()),
            Err(Error::DuplicateInstrument(id)) if id == "A"
        ));
    }

    #[test]
    fn test_csv_source_ignores_repeated_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, CSV).unwrap();

        let source = CsvPriceSource::new(&path);
        let request = PriceRequest::new(vec!["MSFT".into(), "AAPL".into(), "MSFT".into()]);
        let raw = source.fetch(&request).unwrap();

        assert_eq!(raw.columns(), &["MSFT", "AAPL"]);
        assert_eq!(raw.rows()[1].values, vec![Some(370.0), Some(100.0)]);
    }

    #[test]
    fn test_csv_source_missing_file() {
        let source = CsvPriceSource::new("/nonexistent/prices.csv");
        assert!(matches!(
            source.fetch(&PriceRequest::default()),
            Err(Error::Io(_))
        ));
    }
}
