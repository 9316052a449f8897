//! Price cleaning: sort, forward-fill, and drop sparse rows.

use crate::types::{PriceTable, RawPrices, Row, SeriesTable};

/// Minimum share of instruments that must be present for a row to be kept.
pub const MIN_PRESENT_FRACTION: f64 = 0.5;

/// Clean a raw price table.
///
/// Steps, in order:
/// 1. Sort rows by date
/// 2. Forward-fill each instrument from its most recent observation
/// 3. Drop rows where every instrument is missing
/// 4. Drop rows with fewer than `columns * 0.5` present values
///
/// Never fails. An empty or all-missing input yields an empty table with the same columns.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use riskdesk_core::{prices::clean, RawPrices};
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let mut raw = RawPrices::new(vec!["A".into(), "B".into()]).unwrap();
/// raw.push_row(day(3), vec![None, Some(11.0)]).unwrap();
/// raw.push_row(day(2), vec![Some(5.0), Some(10.0)]).unwrap();
///
/// let table = clean(&raw);
/// assert_eq!(table.len(), 2);
/// // A is carried forward from Jan 2
/// assert_eq!(table.get(1, "A"), Some(5.0));
/// ```
pub fn clean(raw: &RawPrices) -> PriceTable {
    let mut rows = raw.rows().to_vec();
    rows.sort_by_key(|r| r.date);

    let width = raw.columns().len();
    let min_present = width as f64 * MIN_PRESENT_FRACTION;

    let kept: Vec<Row> = fill_rows(rows, width)
        .into_iter()
        .filter(|row| !row.is_empty() && row.present_count() as f64 >= min_present)
        .collect();

    tracing::debug!(
        "Cleaned prices: {} raw rows -> {} rows across {} instruments",
        raw.len(),
        kept.len(),
        width
    );

    SeriesTable::from_parts_unchecked(raw.columns().to_vec(), kept)
}

/// Forward-fill missing values per column. Leading gaps stay missing.
pub fn forward_fill(table: &SeriesTable) -> SeriesTable {
    SeriesTable::from_parts_unchecked(
        table.columns().to_vec(),
        fill_rows(table.rows().to_vec(), table.width()),
    )
}

/// Remove rows in which every value is missing.
pub fn drop_empty_rows(table: &SeriesTable) -> SeriesTable {
    let rows = table
        .rows()
        .iter()
        .filter(|r| !r.is_empty())
        .cloned()
        .collect();
    SeriesTable::from_parts_unchecked(table.columns().to_vec(), rows)
}

fn fill_rows(mut rows: Vec<Row>, width: usize) -> Vec<Row> {
    let mut last_seen: Vec<Option<f64>> = vec![None; width];
    for row in &mut rows {
        for (value, last) in row.values.iter_mut().zip(last_seen.iter_mut()) {
            match value {
                Some(v) => *last = Some(*v),
                None => *value = *last,
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dates, table};

    fn raw(columns: &[&str], rows: Vec<(usize, Vec<Option<f64>>)>) -> RawPrices {
        let d = dates(16);
        RawPrices::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .map(|(i, values)| Row::new(d[i], values))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_clean_sorts_by_date() {
        let input = raw(
            &["A"],
            vec![
                (2, vec![Some(3.0)]),
                (0, vec![Some(1.0)]),
                (1, vec![Some(2.0)]),
            ],
        );
        let cleaned = clean(&input);
        assert_eq!(cleaned.column("A").unwrap(), vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(cleaned.dates().collect::<Vec<_>>().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_forward_fill_keeps_leading_gap() {
        let t = table(&[("A", &[None, Some(1.0), None, None, Some(4.0)])]);
        let filled = forward_fill(&t);
        assert_eq!(
            filled.column("A").unwrap(),
            vec![None, Some(1.0), Some(1.0), Some(1.0), Some(4.0)]
        );
    }

    #[test]
    fn test_clean_drops_all_missing_rows() {
        let input = raw(
            &["A", "B"],
            vec![(0, vec![None, None]), (1, vec![Some(1.0), Some(2.0)])],
        );
        let cleaned = clean(&input);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.rows()[0].date, dates(2)[1]);
    }

    #[test]
    fn test_clean_threshold_three_instruments() {
        // 3 columns: need at least 1.5 present, i.e. 2
        let input = raw(
            &["A", "B", "C"],
            vec![
                (0, vec![Some(1.0), None, None]),
                (1, vec![Some(1.0), Some(2.0), None]),
                (2, vec![Some(1.5), None, None]),
            ],
        );
        let cleaned = clean(&input);
        // row 0 has one value and no history to fill from
        // row 2 inherits B from row 1, so it has two
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.rows()[1].values, vec![Some(1.5), Some(2.0), None]);
    }

    #[test]
    fn test_clean_two_instruments_keeps_half_present_rows() {
        let input = raw(
            &["A", "DEAD"],
            vec![(0, vec![Some(1.0), None]), (1, vec![Some(2.0), None])],
        );
        let cleaned = clean(&input);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.column("DEAD").unwrap(), vec![None, None]);
    }

    #[test]
    fn test_clean_empty_inputs() {
        let no_rows = RawPrices::new(vec!["A".to_string()]).unwrap();
        assert!(clean(&no_rows).is_empty());

        let all_missing = raw(&["A"], vec![(0, vec![None]), (1, vec![None])]);
        let cleaned = clean(&all_missing);
        assert!(cleaned.is_empty());
        assert_eq!(cleaned.columns(), &["A".to_string()]);

        let no_columns = raw(&[], vec![(0, vec![])]);
        assert!(clean(&no_columns).is_empty());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let input = raw(
            &["A", "B"],
            vec![
                (3, vec![Some(4.0), None]),
                (0, vec![None, Some(1.0)]),
                (1, vec![Some(2.0), None]),
                (2, vec![None, None]),
            ],
        );
        let once = clean(&input);
        let twice = clean(&RawPrices::from(once.clone()));
        assert_eq!(once, twice);
    }
}
