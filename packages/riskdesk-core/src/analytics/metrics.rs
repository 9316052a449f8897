//! Annualized summary metrics per instrument.

use super::drawdown::{max_drawdown, DrawdownSeries};
use super::{mean, population_std};
use crate::types::{PriceTable, ReturnTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Annualized statistics for one instrument.
///
/// Every field is `None` when the instrument has no valid return observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualMetricsRecord {
    /// Instrument identifier, exactly as in the input table
    pub instrument: String,
    /// Mean daily return times trading days per year
    pub annual_return: Option<f64>,
    /// Population standard deviation times `sqrt(trading days)`
    pub annual_vol: Option<f64>,
    /// `(annual_return - risk_free_rate) / annual_vol`, undefined when volatility is zero
    pub sharpe: Option<f64>,
    /// Compounded growth over all valid returns
    pub total_return: Option<f64>,
    /// Maximum drawdown of the price series, attached separately
    pub max_drawdown: Option<f64>,
}

impl AnnualMetricsRecord {
    /// A record with no defined metrics.
    pub fn undefined(instrument: &str) -> Self {
        Self {
            instrument: instrument.to_string(),
            annual_return: None,
            annual_vol: None,
            sharpe: None,
            total_return: None,
            max_drawdown: None,
        }
    }

    /// Compute the four return-based metrics from valid (non-missing) daily returns.
    ///
    /// `annual_return` scales the arithmetic mean linearly while `total_return`
    /// compounds geometrically; the two are not expected to agree.
    pub fn from_returns(
        instrument: &str,
        returns: &[f64],
        risk_free_rate: f64,
        trading_days: u32,
    ) -> Self {
        let (Some(mean_daily), Some(std_daily)) = (mean(returns), population_std(returns)) else {
            return Self::undefined(instrument);
        };

        let days = f64::from(trading_days);
        let annual_return = mean_daily * days;
        let annual_vol = std_daily * days.sqrt();

        let sharpe = if annual_vol != 0.0 {
            Some((annual_return - risk_free_rate) / annual_vol).filter(|s| s.is_finite())
        } else {
            None
        };

        let total_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;

        Self {
            instrument: instrument.to_string(),
            annual_return: Some(annual_return),
            annual_vol: Some(annual_vol),
            sharpe,
            total_return: Some(total_return),
            max_drawdown: None,
        }
    }
}

/// Per-instrument metrics in the column order of the return table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    records: Vec<AnnualMetricsRecord>,
}

impl MetricsSummary {
    /// All records in order.
    pub fn records(&self) -> &[AnnualMetricsRecord] {
        &self.records
    }

    /// Record for one instrument.
    pub fn get(&self, instrument: &str) -> Option<&AnnualMetricsRecord> {
        self.records.iter().find(|r| r.instrument == instrument)
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no instruments.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Attach maximum drawdowns. Both sides must cover the same instruments, once each.
    pub fn with_drawdowns(mut self, drawdowns: &DrawdownSeries) -> Result<Self> {
        let ours = unique_ids(self.records.iter().map(|r| r.instrument.as_str()))?;
        let theirs = unique_ids(drawdowns.instruments())?;

        if ours != theirs {
            let mut missing: Vec<&str> = ours.symmetric_difference(&theirs).copied().collect();
            missing.sort_unstable();
            return Err(Error::InstrumentMismatch(missing.join(", ")));
        }

        for record in &mut self.records {
            record.max_drawdown = drawdowns.get(&record.instrument);
        }
        Ok(self)
    }

    /// Leaders and laggards across instruments, ignoring undefined metrics.
    pub fn key_findings(&self) -> KeyFindings {
        KeyFindings {
            top_return: self.extreme(|r| r.annual_return, true),
            best_sharpe: self.extreme(|r| r.sharpe, true),
            lowest_vol: self.extreme(|r| r.annual_vol, false),
            worst_drawdown: self.extreme(|r| r.max_drawdown, false),
        }
    }

    fn extreme(
        &self,
        metric: impl Fn(&AnnualMetricsRecord) -> Option<f64>,
        highest: bool,
    ) -> Option<Finding> {
        let mut best: Option<Finding> = None;
        for record in &self.records {
            let Some(value) = metric(record) else {
                continue;
            };
            // first instrument wins ties
            let better = match &best {
                None => true,
                Some(current) if highest => value > current.value,
                Some(current) => value < current.value,
            };
            if better {
                best = Some(Finding {
                    instrument: record.instrument.clone(),
                    value,
                });
            }
        }
        best
    }
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::DuplicateInstrument(id.to_string()));
        }
    }
    Ok(seen)
}

impl FromIterator<AnnualMetricsRecord> for MetricsSummary {
    fn from_iter<I: IntoIterator<Item = AnnualMetricsRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// One instrument singled out by a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub instrument: String,
    pub value: f64,
}

/// Headline results across all instruments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFindings {
    /// Highest annualized return
    pub top_return: Option<Finding>,
    /// Highest Sharpe ratio
    pub best_sharpe: Option<Finding>,
    /// Lowest annualized volatility
    pub lowest_vol: Option<Finding>,
    /// Most negative maximum drawdown
    pub worst_drawdown: Option<Finding>,
}

/// Compute annualized metrics for every column of a daily return table.
///
/// Missing returns are excluded, not treated as zero. `max_drawdown` is left `None`;
/// use [`summary_stats`] or [`MetricsSummary::with_drawdowns`] to fill it.
///
/// # Arguments
///
/// * `daily` - Daily simple returns
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.04 for 4%)
/// * `trading_days` - Trading days per year (typically 252)
pub fn annual_metrics(
    daily: &ReturnTable,
    risk_free_rate: f64,
    trading_days: u32,
) -> MetricsSummary {
    daily
        .columns()
        .iter()
        .enumerate()
        .map(|(column, id)| {
            let valid: Vec<f64> = daily.column_values(column).flatten().collect();
            if valid.is_empty() {
                tracing::warn!("No valid returns for {}; metrics are undefined", id);
            }
            AnnualMetricsRecord::from_returns(id, &valid, risk_free_rate, trading_days)
        })
        .collect()
}

/// Annualized metrics with maximum drawdown attached from `prices`.
///
/// `prices` and `daily` must share the same instruments.
pub fn summary_stats(
    prices: &PriceTable,
    daily: &ReturnTable,
    risk_free_rate: f64,
    trading_days: u32,
) -> Result<MetricsSummary> {
    annual_metrics(daily, risk_free_rate, trading_days).with_drawdowns(&max_drawdown(prices))
}
