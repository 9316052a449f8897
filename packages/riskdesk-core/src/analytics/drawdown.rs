//! Peak-to-trough drawdown.

use crate::types::{DrawdownTable, PriceTable};
use serde::{Deserialize, Serialize};

/// Maximum drawdown per instrument, in column order.
///
/// Values are `<= 0`. `None` means the instrument had no observations at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownSeries {
    entries: Vec<(String, Option<f64>)>,
}

impl DrawdownSeries {
    /// Maximum drawdown for an instrument. `None` if unknown or undefined.
    pub fn get(&self, instrument: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(id, _)| id == instrument)
            .and_then(|(_, dd)| *dd)
    }

    /// Whether the instrument is part of this series.
    pub fn contains(&self, instrument: &str) -> bool {
        self.entries.iter().any(|(id, _)| id == instrument)
    }

    /// Instrument identifiers in column order.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Iterate `(instrument, max_drawdown)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.entries.iter().map(|(id, dd)| (id.as_str(), *dd))
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no instruments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Option<f64>)> for DrawdownSeries {
    fn from_iter<I: IntoIterator<Item = (String, Option<f64>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Drawdown of every observation from the running peak of its column.
///
/// The peak includes the current point, so a new high has drawdown 0. Missing prices
/// neither move the peak nor produce a value.
pub fn drawdown_table(prices: &PriceTable) -> DrawdownTable {
    let data = (0..prices.width())
        .map(|column| underwater(prices.column_values(column)))
        .collect();
    prices.with_column_data(data)
}

/// Maximum drawdown: the most negative value of each column's underwater curve.
///
/// A non-decreasing series and a single observation both give 0.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use riskdesk_core::{max_drawdown, SeriesTable};
///
/// let dates = (1..=4).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap()).collect();
/// let prices = SeriesTable::from_column_data(
///     vec!["X".into()],
///     dates,
///     vec![vec![Some(100.0), Some(110.0), Some(99.0), Some(121.0)]],
/// )
/// .unwrap();
///
/// let mdd = max_drawdown(&prices);
/// assert!((mdd.get("X").unwrap() + 0.10).abs() < 1e-12);
/// ```
pub fn max_drawdown(prices: &PriceTable) -> DrawdownSeries {
    prices
        .columns()
        .iter()
        .enumerate()
        .map(|(column, id)| {
            let worst = underwater(prices.column_values(column))
                .into_iter()
                .flatten()
                .fold(None, |acc: Option<f64>, dd| Some(acc.map_or(dd, |a| a.min(dd))));
            (id.clone(), worst)
        })
        .collect()
}

fn underwater(prices: impl Iterator<Item = Option<f64>>) -> Vec<Option<f64>> {
    let mut peak: Option<f64> = None;
    prices
        .map(|price| {
            let price = price?;
            let running_max = peak.map_or(price, |p| p.max(price));
            peak = Some(running_max);
            if running_max == 0.0 {
                return None;
            }
            Some((price - running_max) / running_max)
        })
        .collect()
}
