//! End-to-end analysis run: raw prices in, every result table out.

use crate::analytics::{
    cumulative_returns, daily_returns, drawdown_table, rolling_mean_return, rolling_volatility,
    summary_stats, KeyFindings, MetricsSummary,
};
use crate::config::AnalysisConfig;
use crate::prices::clean;
use crate::types::{
    CumulativeReturnTable, DrawdownTable, PriceTable, RawPrices, ReturnTable, RollingStatTable,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Every table produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Parameters the run used
    pub config: AnalysisConfig,
    /// Cleaned prices
    pub prices: PriceTable,
    /// Missing cells left after cleaning (leading gaps)
    pub missing_values: usize,
    /// Daily simple returns
    pub daily_returns: ReturnTable,
    /// Compounded cumulative returns
    pub cumulative_returns: CumulativeReturnTable,
    /// Annualized rolling volatility
    pub rolling_volatility: RollingStatTable,
    /// Annualized rolling mean return
    pub rolling_mean_return: RollingStatTable,
    /// Underwater curve
    pub drawdowns: DrawdownTable,
    /// Per-instrument annual metrics with max drawdown
    pub summary: MetricsSummary,
    /// Leaders and laggards
    pub key_findings: KeyFindings,
}

/// Run the full pipeline on raw prices.
///
/// Returns [`Error::EmptyInput`] when cleaning leaves no rows or no instruments.
/// Per-instrument gaps never fail the run; they surface as `None` metrics.
pub fn run_report(raw: &RawPrices, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let prices = clean(raw);
    if prices.width() == 0 {
        return Err(Error::EmptyInput("no instruments in price table".to_string()));
    }
    if prices.is_empty() {
        return Err(Error::EmptyInput(format!(
            "no usable price rows for {}",
            prices.columns().join(", ")
        )));
    }

    let days = config.trading_days_per_year;
    let daily = daily_returns(&prices);
    let cumulative = cumulative_returns(&daily);
    let rolling_vol = rolling_volatility(&daily, config.rolling_window, days)?;
    let rolling_mean = rolling_mean_return(&daily, config.rolling_window, days)?;
    let drawdowns = drawdown_table(&prices);
    let summary = summary_stats(&prices, &daily, config.risk_free_rate, days)?;
    let key_findings = summary.key_findings();

    for record in summary.records() {
        if record.sharpe.is_none() && record.annual_vol.is_some() {
            tracing::warn!("Sharpe ratio undefined for {}: zero volatility", record.instrument);
        }
    }

    tracing::info!(
        "Analyzed {} instruments over {} price rows",
        prices.width(),
        prices.len()
    );

    Ok(AnalysisReport {
        config: config.clone(),
        missing_values: prices.missing_count(),
        prices,
        daily_returns: daily,
        cumulative_returns: cumulative,
        rolling_volatility: rolling_vol,
        rolling_mean_return: rolling_mean,
        drawdowns,
        summary,
        key_findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table;
    use approx::assert_relative_eq;

    fn config(window: usize) -> AnalysisConfig {
        AnalysisConfig {
            rolling_window: window,
            ..Default::default()
        }
    }

    #[test]
    fn test_report_tables_line_up() {
        let raw = RawPrices::from(table(&[
            ("A", &[Some(100.0), Some(110.0), Some(99.0), Some(121.0)]),
            ("B", &[None, Some(20.0), Some(21.0), Some(22.0)]),
        ]));
        let report = run_report(&raw, &config(2)).unwrap();

        assert_eq!(report.prices.len(), 4);
        assert_eq!(report.missing_values, 1);
        assert_eq!(report.daily_returns.len(), 3);
        assert_eq!(report.cumulative_returns.len(), 3);
        assert_eq!(report.rolling_volatility.len(), 3);
        assert_eq!(report.drawdowns.len(), 4);
        assert_eq!(report.summary.len(), 2);

        let a = report.summary.get("A").unwrap();
        assert_relative_eq!(a.total_return.unwrap(), 0.21, epsilon = 1e-12);
        assert_relative_eq!(a.max_drawdown.unwrap(), -0.1, epsilon = 1e-12);
        assert_eq!(report.key_findings.worst_drawdown.unwrap().instrument, "A");
    }

    #[test]
    fn test_report_empty_input() {
        let no_rows = RawPrices::new(vec!["A".to_string()]).unwrap();
        assert!(matches!(
            run_report(&no_rows, &AnalysisConfig::default()),
            Err(Error::EmptyInput(_))
        ));

        let no_columns = RawPrices::new(Vec::new()).unwrap();
        assert!(matches!(
            run_report(&no_columns, &AnalysisConfig::default()),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn test_report_rejects_invalid_config() {
        let raw = RawPrices::from(table(&[("A", &[Some(1.0), Some(2.0)])]));
        assert!(matches!(
            run_report(&raw, &config(0)),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_report_single_row_has_undefined_metrics() {
        let raw = RawPrices::from(table(&[("A", &[Some(100.0)])]));
        let report = run_report(&raw, &AnalysisConfig::default()).unwrap();

        assert!(report.daily_returns.is_empty());
        let record = report.summary.get("A").unwrap();
        assert_eq!(record.annual_return, None);
        assert_eq!(record.max_drawdown, Some(0.0));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let raw = RawPrices::from(table(&[("A", &[Some(1.0), Some(2.0), Some(2.0)])]));
        let report = run_report(&raw, &config(2)).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["summary"]["records"][0]["instrument"], "A");
        assert!(json["rolling_volatility"]["rows"][0]["values"][0].is_null());

        let back: AnalysisReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.prices, report.prices);
        assert_eq!(back.config, report.config);
    }
}
