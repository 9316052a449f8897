//! Daily and cumulative returns.

use crate::prices::{drop_empty_rows, forward_fill};
use crate::types::{
    finite, CumulativeReturnTable, PriceTable, ReturnTable, Row, SeriesTable,
};
use serde::{Deserialize, Serialize};

/// Compute daily simple returns: `price[t] / price[t-1] - 1`.
///
/// The first row has no predecessor and is dropped, so the result has one row fewer
/// than `prices`. A cell is `None` when either price is missing or the previous price
/// is zero.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use riskdesk_core::{daily_returns, SeriesTable};
///
/// let dates = (1..=4).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap()).collect();
/// let prices = SeriesTable::from_column_data(
///     vec!["X".into()],
///     dates,
///     vec![vec![Some(100.0), Some(110.0), Some(99.0), Some(121.0)]],
/// )
/// .unwrap();
///
/// let returns = daily_returns(&prices);
/// assert_eq!(returns.len(), 3);
/// assert!((returns.get(0, "X").unwrap() - 0.10).abs() < 1e-12);
/// assert!((returns.get(1, "X").unwrap() + 0.10).abs() < 1e-12);
/// ```
pub fn daily_returns(prices: &PriceTable) -> ReturnTable {
    let rows = prices
        .rows()
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            let values = prev
                .values
                .iter()
                .zip(&curr.values)
                .map(|(p, c)| simple_return(*p, *c))
                .collect();
            Row::new(curr.date, values)
        })
        .collect();

    SeriesTable::from_parts_unchecked(prices.columns().to_vec(), rows)
}

#[inline]
fn simple_return(prev: Option<f64>, curr: Option<f64>) -> Option<f64> {
    match (prev, curr) {
        (Some(p), Some(c)) if p != 0.0 => finite(Some(c / p - 1.0)),
        _ => None,
    }
}

/// Compound daily returns into cumulative growth: `prod(1 + r) - 1`.
///
/// Missing returns stay missing and do not break the running product; the next
/// present value continues compounding from the last one.
pub fn cumulative_returns(daily: &ReturnTable) -> CumulativeReturnTable {
    let mut growth = vec![1.0_f64; daily.width()];
    let rows = daily
        .rows()
        .iter()
        .map(|row| {
            let values = row
                .values
                .iter()
                .zip(growth.iter_mut())
                .map(|(r, g)| {
                    let r = (*r)?;
                    *g *= 1.0 + r;
                    Some(*g - 1.0)
                })
                .collect();
            Row::new(row.date, values)
        })
        .collect();

    SeriesTable::from_parts_unchecked(daily.columns().to_vec(), rows)
}

/// Output of [`prepare_returns`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedReturns {
    /// Forward-filled prices with empty rows removed
    pub prices: PriceTable,
    /// Daily simple returns
    pub daily: ReturnTable,
    /// Compounded cumulative returns
    pub cumulative: CumulativeReturnTable,
}

/// Forward-fill prices, drop empty rows, then derive daily and cumulative returns.
///
/// Rows are already date-ordered by construction of [`SeriesTable`]. Calling this on its
/// own `prices` output yields the same result.
pub fn prepare_returns(prices: &PriceTable) -> PreparedReturns {
    let prices = drop_empty_rows(&forward_fill(prices));
    let daily = daily_returns(&prices);
    let cumulative = cumulative_returns(&daily);

    tracing::debug!(
        "Prepared returns: {} price rows, {} return rows",
        prices.len(),
        daily.len()
    );

    PreparedReturns {
        prices,
        daily,
        cumulative,
    }
}
