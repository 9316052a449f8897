//! Returns and risk analytics.
//!
//! This module provides the numeric stages of the pipeline:
//!
//! - **Returns**: daily simple returns and compounded cumulative returns
//! - **Rolling**: trailing-window mean and volatility, raw and annualized
//! - **Drawdown**: underwater curve and maximum drawdown
//! - **Metrics**: annualized return, volatility, Sharpe ratio and total return
//!
//! Missing observations are always `None`. A statistic that cannot be computed is
//! reported as `None` rather than zero, NaN or infinity.

mod drawdown;
mod metrics;
mod returns;
mod rolling;

pub use drawdown::{drawdown_table, max_drawdown, DrawdownSeries};
pub use metrics::{
    annual_metrics, summary_stats, AnnualMetricsRecord, Finding, KeyFindings, MetricsSummary,
};
pub use returns::{cumulative_returns, daily_returns, prepare_returns, PreparedReturns};
pub use rolling::{rolling_mean, rolling_mean_return, rolling_std, rolling_volatility};

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (denominator N). `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (denominator N-1). `None` with fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_population_vs_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        // Classic example: population std = 2
        assert_relative_eq!(population_std(&values).unwrap(), 2.0);
        // Sample std = sqrt(32 / 7)
        assert_relative_eq!(sample_std(&values).unwrap(), (32.0_f64 / 7.0).sqrt());
    }

    #[test]
    fn test_std_degenerate_inputs() {
        assert_eq!(population_std(&[]), None);
        assert_eq!(population_std(&[3.0]), Some(0.0));
        assert_eq!(sample_std(&[3.0]), None);
    }
}
