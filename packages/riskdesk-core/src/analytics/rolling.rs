//! Trailing-window statistics over return (or price) tables.

use super::{mean, sample_std};
use crate::types::{ReturnTable, RollingStatTable, SeriesTable};
use crate::{Error, Result};

/// Rolling mean over the trailing `window` observations of each column.
///
/// The value at row `t` covers rows `t-window+1..=t`. Rows before `window-1`, and any
/// window containing a missing observation, are `None`.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use riskdesk_core::{analytics::rolling_mean, SeriesTable};
///
/// let dates = (1..=5).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap()).collect();
/// let data = vec![vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]];
/// let table = SeriesTable::from_column_data(vec!["X".into()], dates, data).unwrap();
///
/// let means = rolling_mean(&table, 3).unwrap();
/// assert_eq!(means.get(1, "X"), None);
/// assert_eq!(means.get(2, "X"), Some(2.0));
/// assert_eq!(means.get(4, "X"), Some(4.0));
/// ```
pub fn rolling_mean(table: &SeriesTable, window: usize) -> Result<SeriesTable> {
    rolling_apply(table, window, mean)
}

/// Rolling sample standard deviation (denominator N-1).
///
/// A window of 1 has no sample deviation, so every cell is `None`.
pub fn rolling_std(table: &SeriesTable, window: usize) -> Result<SeriesTable> {
    rolling_apply(table, window, sample_std)
}

/// Annualized rolling volatility: rolling sample std scaled by `sqrt(trading_days)`.
pub fn rolling_volatility(
    daily: &ReturnTable,
    window: usize,
    trading_days: u32,
) -> Result<RollingStatTable> {
    let factor = f64::from(trading_days).sqrt();
    Ok(rolling_std(daily, window)?.map_values(|v| v * factor))
}

/// Annualized rolling mean return: rolling mean scaled by `trading_days`.
pub fn rolling_mean_return(
    daily: &ReturnTable,
    window: usize,
    trading_days: u32,
) -> Result<RollingStatTable> {
    let factor = f64::from(trading_days);
    Ok(rolling_mean(daily, window)?.map_values(|v| v * factor))
}

fn rolling_apply<F>(table: &SeriesTable, window: usize, stat: F) -> Result<SeriesTable>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if window == 0 {
        return Err(Error::InvalidWindow(window));
    }

    if window > table.len() {
        tracing::debug!(
            "Rolling window {} exceeds {} available rows; result is undefined",
            window,
            table.len()
        );
    }

    let mut buf = Vec::with_capacity(window);
    let data: Vec<Vec<Option<f64>>> = (0..table.width())
        .map(|column| {
            let values: Vec<Option<f64>> = table.column_values(column).collect();
            (0..values.len())
                .map(|t| {
                    if t + 1 < window {
                        return None;
                    }
                    buf.clear();
                    for v in &values[t + 1 - window..=t] {
                        buf.push((*v)?);
                    }
                    stat(&buf)
                })
                .collect()
        })
        .collect();

    Ok(table.with_column_data(data))
}
