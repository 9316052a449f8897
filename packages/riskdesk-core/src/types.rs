//! Core table types shared by every pipeline stage.
//!
//! A [`SeriesTable`] is an ordered list of dated rows over a fixed list of column
//! identifiers. Missing observations are `None`; non-finite floats are never stored.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Table of prices, one column per instrument.
pub type PriceTable = SeriesTable;
/// Table of per-period simple returns.
pub type ReturnTable = SeriesTable;
/// Table of compounded growth since the first return.
pub type CumulativeReturnTable = SeriesTable;
/// Table of trailing-window statistics.
pub type RollingStatTable = SeriesTable;
/// Per-date drawdown from the running peak.
pub type DrawdownTable = SeriesTable;

/// A single dated row of values, one per column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    /// Observation date
    pub date: NaiveDate,
    /// One value per column, `None` when missing
    pub values: Vec<Option<f64>>,
}

impl Row {
    /// Create a row, turning NaN and infinities into missing values.
    pub fn new(date: NaiveDate, values: Vec<Option<f64>>) -> Self {
        Self {
            date,
            values: values.into_iter().map(finite).collect(),
        }
    }

    /// Number of non-missing values.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Whether every value is missing.
    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

#[inline]
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Instrument identifiers must be unique; every lookup is by identifier.
fn check_columns(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for id in columns {
        if !seen.insert(id.as_str()) {
            return Err(Error::DuplicateInstrument(id.clone()));
        }
    }
    Ok(())
}

/// Serialized layout shared by [`SeriesTable`] and [`RawPrices`].
#[derive(Deserialize)]
struct TableParts {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Date-indexed table with strictly increasing, unique dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "TableParts")]
pub struct SeriesTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TryFrom<TableParts> for SeriesTable {
    type Error = Error;

    fn try_from(parts: TableParts) -> Result<Self> {
        Self::from_rows(parts.columns, parts.rows)
    }
}

impl SeriesTable {
    /// Create an empty table with the given columns.
    ///
    /// Returns [`Error::DuplicateInstrument`] if an identifier repeats.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        check_columns(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Build a table from rows, validating columns, widths and date order.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row.date, row.values)?;
        }
        Ok(table)
    }

    /// Build a table from column-major data sharing one date index.
    pub fn from_column_data(
        columns: Vec<String>,
        dates: Vec<NaiveDate>,
        data: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if data.len() != columns.len() {
            return Err(Error::ColumnLength {
                column: "<table>".to_string(),
                expected: columns.len(),
                found: data.len(),
            });
        }
        for (column, values) in columns.iter().zip(&data) {
            if values.len() != dates.len() {
                return Err(Error::ColumnLength {
                    column: column.clone(),
                    expected: dates.len(),
                    found: values.len(),
                });
            }
        }

        let mut table = Self::new(columns)?;
        for (i, date) in dates.into_iter().enumerate() {
            let values = data.iter().map(|column| column[i]).collect();
            table.push_row(date, values)?;
        }
        Ok(table)
    }

    /// Construct without validation. Callers guarantee unique columns, widths and date order.
    pub(crate) fn from_parts_unchecked(columns: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(check_columns(&columns).is_ok());
        debug_assert!(rows.iter().all(|r| r.values.len() == columns.len()));
        debug_assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        Self { columns, rows }
    }

    /// Append a row after the current last row.
    pub fn push_row(&mut self, date: NaiveDate, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::RowWidth {
                date,
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        if let Some(last) = self.rows.last() {
            if date == last.date {
                return Err(Error::DuplicateDate(date));
            }
            if date < last.date {
                return Err(Error::UnorderedDates {
                    previous: last.date,
                    next: date,
                });
            }
        }
        self.rows.push(Row::new(date, values));
        Ok(())
    }

    /// Column identifiers in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in date order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Dates in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|r| r.date)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column identifier (exact match).
    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == id)
    }

    /// Value at (row index, column index).
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.values.get(column).copied().flatten())
    }

    /// Value at (row index, column identifier).
    pub fn get(&self, row: usize, id: &str) -> Option<f64> {
        self.column_index(id).and_then(|c| self.value(row, c))
    }

    /// Iterate one column's values in date order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows
            .iter()
            .map(move |r| r.values.get(column).copied().flatten())
    }

    /// Copy out a column by identifier.
    pub fn column(&self, id: &str) -> Result<Vec<Option<f64>>> {
        let index = self
            .column_index(id)
            .ok_or_else(|| Error::UnknownInstrument(id.to_string()))?;
        Ok(self.column_values(index).collect())
    }

    /// The last row, if any.
    pub fn last_row(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Total number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.len() - r.present_count())
            .sum()
    }

    /// Apply `f` to every present value, keeping the shape.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| Row::new(r.date, r.values.iter().map(|v| v.map(&f)).collect()))
            .collect();
        Self::from_parts_unchecked(self.columns.clone(), rows)
    }

    /// Same dates and columns, new column-major values.
    pub(crate) fn with_column_data(&self, data: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert_eq!(data.len(), self.columns.len());
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| Row::new(r.date, data.iter().map(|column| column[i]).collect()))
            .collect();
        Self::from_parts_unchecked(self.columns.clone(), rows)
    }
}

/// Raw price observations as delivered by a price source.
///
/// Rows may arrive in any date order and contain gaps. Instruments and dates must be
/// unique and every row must carry one value per column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "TableParts")]
pub struct RawPrices {
    columns: Vec<String>,
    rows: Vec<Row>,
    #[serde(skip)]
    dates: HashSet<NaiveDate>,
}

impl TryFrom<TableParts> for RawPrices {
    type Error = Error;

    fn try_from(parts: TableParts) -> Result<Self> {
        Self::from_rows(parts.columns, parts.rows)
    }
}

impl RawPrices {
    /// Create an empty raw table for the given instruments.
    ///
    /// Returns [`Error::DuplicateInstrument`] if an identifier repeats.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        check_columns(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
            dates: HashSet::new(),
        })
    }

    /// Build from rows in any order.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut raw = Self::new(columns)?;
        raw.rows.reserve(rows.len());
        raw.dates.reserve(rows.len());
        for row in rows {
            raw.push_row(row.date, row.values)?;
        }
        Ok(raw)
    }

    /// Append an observation row.
    pub fn push_row(&mut self, date: NaiveDate, values: Vec<Option<f64>>) -> Result<()> {
        self.check_width(date, values.len())?;
        if !self.dates.insert(date) {
            return Err(Error::DuplicateDate(date));
        }
        self.rows.push(Row::new(date, values));
        Ok(())
    }

    fn check_width(&self, date: NaiveDate, found: usize) -> Result<()> {
        if found != self.columns.len() {
            return Err(Error::RowWidth {
                date,
                expected: self.columns.len(),
                found,
            });
        }
        Ok(())
    }

    /// Instrument identifiers.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in arrival order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<SeriesTable> for RawPrices {
    fn from(table: SeriesTable) -> Self {
        Self {
            dates: table.rows.iter().map(|r| r.date).collect(),
            columns: table.columns,
            rows: table.rows,
        }
    }
}

/// JSON envelope used by the command line front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dates, table};

    fn cols(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut t = SeriesTable::new(cols(&["A", "B"])).unwrap();
        let d = dates(1)[0];
        let err = t.push_row(d, vec![Some(1.0)]).unwrap_err();
        assert!(matches!(
            err,
            Error::RowWidth {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_push_row_rejects_out_of_order_dates() {
        let d = dates(2);
        let mut t = SeriesTable::new(cols(&["A"])).unwrap();
        t.push_row(d[1], vec![Some(1.0)]).unwrap();

        assert!(matches!(
            t.push_row(d[1], vec![Some(2.0)]),
            Err(Error::DuplicateDate(_))
        ));
        assert!(matches!(
            t.push_row(d[0], vec![Some(2.0)]),
            Err(Error::UnorderedDates { .. })
        ));
    }

    #[test]
    fn test_non_finite_values_become_missing() {
        let t = table(&[("A", &[Some(1.0), Some(f64::NAN), Some(f64::INFINITY)])]);
        assert_eq!(t.column("A").unwrap(), vec![Some(1.0), None, None]);
        assert_eq!(t.missing_count(), 2);
    }

    #[test]
    fn test_lookup_by_column_id() {
        let t = table(&[("aapl", &[Some(1.0), Some(2.0)]), ("MSFT", &[None, Some(3.0)])]);
        assert_eq!(t.get(1, "MSFT"), Some(3.0));
        assert_eq!(t.get(0, "MSFT"), None);
        // identifiers are case sensitive
        assert_eq!(t.get(0, "AAPL"), None);
        assert!(matches!(t.column("GOOG"), Err(Error::UnknownInstrument(_))));
    }

    #[test]
    fn test_from_column_data_checks_lengths() {
        let result = SeriesTable::from_column_data(
            cols(&["A"]),
            dates(3),
            vec![vec![Some(1.0), Some(2.0)]],
        );
        assert!(matches!(result, Err(Error::ColumnLength { .. })));
    }

    #[test]
    fn test_raw_prices_accept_any_order_but_not_duplicates() {
        let d = dates(3);
        let mut raw = RawPrices::new(cols(&["A"])).unwrap();
        raw.push_row(d[2], vec![Some(3.0)]).unwrap();
        raw.push_row(d[0], vec![Some(1.0)]).unwrap();
        assert_eq!(raw.len(), 2);
        assert!(matches!(
            raw.push_row(d[0], vec![Some(9.0)]),
            Err(Error::DuplicateDate(_))
        ));
    }

    #[test]
    fn test_repeated_instrument_is_rejected() {
        assert!(matches!(
            SeriesTable::new(cols(&["A", "B", "A"])),
            Err(Error::DuplicateInstrument(id)) if id == "A"
        ));
        assert!(matches!(
            RawPrices::new(cols(&["X", "X"])),
            Err(Error::DuplicateInstrument(_))
        ));
        let rows = vec![Row::new(dates(1)[0], vec![Some(1.0), Some(2.0)])];
        assert!(matches!(
            RawPrices::from_rows(cols(&["X", "X"]), rows),
            Err(Error::DuplicateInstrument(_))
        ));

        // identifiers differing only by case are distinct
        assert!(SeriesTable::new(cols(&["a", "A"])).is_ok());
    }

    #[test]
    fn test_raw_prices_duplicate_date_after_conversion() {
        let mut raw = RawPrices::from(table(&[("A", &[Some(1.0), Some(2.0)])]));
        assert!(matches!(
            raw.push_row(dates(2)[1], vec![Some(3.0)]),
            Err(Error::DuplicateDate(_))
        ));
        raw.push_row(dates(3)[2], vec![Some(3.0)]).unwrap();
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_deserialize_validates_order() {
        let json = r#"{"columns":["A"],"rows":[
            {"date":"2024-01-02","values":[1.0]},
            {"date":"2024-01-01","values":[2.0]}]}"#;
        assert!(serde_json::from_str::<SeriesTable>(json).is_err());
        assert!(serde_json::from_str::<RawPrices>(json).is_ok());

        let repeated = r#"{"columns":["A","A"],"rows":[]}"#;
        assert!(serde_json::from_str::<SeriesTable>(repeated).is_err());
        assert!(serde_json::from_str::<RawPrices>(repeated).is_err());
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
