//! Riskdesk Core - Returns and risk metrics for price time series.
//!
//! This crate turns a raw, possibly gappy multi-instrument price table into comparable
//! risk/return statistics:
//!
//! - **Price cleaning**: sorting, forward-filling and sparse-row removal
//! - **Returns**: daily simple returns and compounded cumulative returns
//! - **Rolling statistics**: trailing-window mean and volatility, annualized
//! - **Drawdown**: underwater curve and maximum drawdown per instrument
//! - **Annual metrics**: annualized return, volatility, Sharpe ratio, total return
//!
//! Every stage is a pure function over immutable tables. Parameters such as the rolling
//! window, the trading-days constant and the risk-free rate are always explicit arguments.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use riskdesk_core::{analytics, prices, RawPrices};
//!
//! let mut raw = RawPrices::new(vec!["AAPL".to_string()]).unwrap();
//! for (day, price) in [(2, 100.0), (3, 110.0), (4, 99.0), (5, 121.0)] {
//!     let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
//!     raw.push_row(date, vec![Some(price)]).unwrap();
//! }
//!
//! let clean = prices::clean(&raw);
//! let daily = analytics::daily_returns(&clean);
//! let summary = analytics::summary_stats(&clean, &daily, 0.0, 252).unwrap();
//!
//! let record = summary.get("AAPL").unwrap();
//! assert!((record.total_return.unwrap() - 0.21).abs() < 1e-9);
//! assert!((record.max_drawdown.unwrap() + 0.1).abs() < 1e-9);
//! ```

pub mod analytics;
pub mod config;
pub mod data;
pub mod prices;
pub mod report;
pub mod types;

use chrono::NaiveDate;

// Re-export commonly used types
pub use types::{
    ApiResponse, CumulativeReturnTable, DrawdownTable, PriceTable, RawPrices, ReturnTable,
    RollingStatTable, Row, SeriesTable,
};

// Re-export main functionality
pub use analytics::{
    annual_metrics, cumulative_returns, daily_returns, drawdown_table, max_drawdown,
    prepare_returns, rolling_mean_return, rolling_volatility, summary_stats, AnnualMetricsRecord,
    DrawdownSeries, KeyFindings, MetricsSummary, PreparedReturns,
};
pub use config::AnalysisConfig;
pub use data::{CsvPriceSource, PriceRequest, PriceSource};
pub use report::{run_report, AnalysisReport};

/// Conventional number of trading days in a year, used for annualization.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Default trailing window for rolling statistics.
pub const DEFAULT_ROLLING_WINDOW: usize = 20;

/// Error types for riskdesk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No data available: {0}")]
    EmptyInput(String),

    #[error("Row dated {date} has {found} values, expected {expected}")]
    RowWidth {
        date: NaiveDate,
        expected: usize,
        found: usize,
    },

    #[error("Column {column} has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate date: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Duplicate instrument: {0}")]
    DuplicateInstrument(String),

    #[error("Dates must be strictly increasing: {previous} followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("Rolling window must be at least 1, got {0}")]
    InvalidWindow(usize),

    #[error("Instrument sets differ: {0}")]
    InstrumentMismatch(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for riskdesk-core operations.
pub type Result<T> = std::result::Result<T, Error>;
