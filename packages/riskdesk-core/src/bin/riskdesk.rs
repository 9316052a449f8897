//! Riskdesk CLI - Command line interface for price analysis reports.
//!
//! Prints JSON on stdout; logs go to stderr (`RUST_LOG` controls verbosity).

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use riskdesk_core::{
    data::{export_report, save_table},
    prices::clean,
    run_report, AnalysisConfig, AnalysisReport, ApiResponse, CsvPriceSource, PriceRequest,
    PriceSource, RawPrices,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riskdesk")]
#[command(about = "Riskdesk CLI - returns, volatility and drawdown reports from price CSVs")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.riskdesk/config.toml or $RISKDESK_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on a price CSV
    Report {
        /// Price CSV (date column followed by one column per instrument)
        prices: PathBuf,
        /// Instruments to analyze (comma-separated, default: all)
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Annual risk-free rate
        #[arg(long)]
        rf: Option<f64>,
        /// Rolling window in rows
        #[arg(short, long)]
        window: Option<usize>,
        /// Trading days per year
        #[arg(long)]
        trading_days: Option<u32>,
        /// Directory for CSV exports (raw input plus every result table)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print a text summary instead of JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Clean a price CSV and write the result
    Clean {
        /// Raw price CSV
        prices: PathBuf,
        /// Destination CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the effective configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match run(cli) {
        Ok(Some(data)) => serde_json::to_string_pretty(&ApiResponse::ok(data)),
        Ok(None) => return,
        Err(e) => {
            tracing::error!("{:#}", e);
            serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{:#}", e)))
        }
    };

    match output {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("failed to encode response: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `None` when output has already been written.
fn run(cli: Cli) -> anyhow::Result<Option<serde_json::Value>> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load_from_path(path),
        None => AnalysisConfig::load(),
    }
    .context("loading configuration")?;

    match cli.command {
        Commands::Report {
            prices,
            tickers,
            start,
            end,
            rf,
            window,
            trading_days,
            output,
            pretty,
        } => {
            if let Some(rf) = rf {
                config.risk_free_rate = rf;
            }
            if let Some(window) = window {
                config.rolling_window = window;
            }
            if let Some(days) = trading_days {
                config.trading_days_per_year = days;
            }

            let mut request = PriceRequest::new(tickers);
            request.start = start;
            request.end = end;

            let (raw, report) = handle_report(&prices, &request, &config)?;
            if let Some(dir) = output {
                let written = export_report(&raw, &report, &dir)
                    .with_context(|| format!("exporting to {}", dir.display()))?;
                tracing::info!("Exported {} files to {}", written.len(), dir.display());
            }
            if pretty {
                print_summary(&report);
                return Ok(None);
            }
            Ok(Some(serde_json::to_value(&report)?))
        }
        Commands::Clean { prices, output } => {
            let raw = CsvPriceSource::new(&prices).fetch(&PriceRequest::default())?;
            let cleaned = clean(&raw);
            save_table(&cleaned, &output)?;
            Ok(Some(json!({
                "rows": cleaned.len(),
                "instruments": cleaned.columns(),
                "missing_values": cleaned.missing_count(),
                "output": output,
            })))
        }
        Commands::Config => Ok(Some(serde_json::to_value(&config)?)),
    }
}

fn handle_report(
    path: &Path,
    request: &PriceRequest,
    config: &AnalysisConfig,
) -> anyhow::Result<(RawPrices, AnalysisReport)> {
    let source = CsvPriceSource::new(path);
    let raw = source
        .fetch(request)
        .with_context(|| format!("reading prices from {}", path.display()))?;
    let report = run_report(&raw, config)?;
    Ok((raw, report))
}

fn print_summary(report: &AnalysisReport) {
    let first = report.prices.dates().next();
    let last = report.prices.dates().last();
    if let (Some(first), Some(last)) = (first, last) {
        println!("Date Range: {} to {}", first, last);
    }
    println!("Risk-Free Rate: {}", percent(Some(report.config.risk_free_rate)));
    println!(
        "Clean data: {} rows x {} instruments, {} missing values",
        report.prices.len(),
        report.prices.width(),
        report.missing_values
    );
    println!();
    println!(
        "{:<12} {:>14} {:>12} {:>10} {:>14} {:>14}",
        "Instrument", "Annual Return", "Annual Vol", "Sharpe", "Total Return", "Max Drawdown"
    );
    for r in report.summary.records() {
        println!(
            "{:<12} {:>14} {:>12} {:>10} {:>14} {:>14}",
            r.instrument,
            percent(r.annual_return),
            percent(r.annual_vol),
            r.sharpe.map_or_else(|| "n/a".to_string(), |s| format!("{:.4}", s)),
            percent(r.total_return),
            percent(r.max_drawdown),
        );
    }

    let findings = &report.key_findings;
    println!();
    let lines = [
        ("Top Performer (Return)", &findings.top_return, true),
        ("Best Sharpe Ratio", &findings.best_sharpe, false),
        ("Lowest Volatility", &findings.lowest_vol, true),
        ("Worst Drawdown", &findings.worst_drawdown, true),
    ];
    for (label, finding, as_percent) in lines {
        if let Some(f) = finding {
            let value = if as_percent {
                percent(Some(f.value))
            } else {
                format!("{:.4}", f.value)
            };
            println!("{}: {} ({})", label, f.instrument, value);
        }
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}
