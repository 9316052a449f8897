//! CSV export of result tables.

use crate::analytics::MetricsSummary;
use crate::report::AnalysisReport;
use crate::types::{RawPrices, Row, SeriesTable};
use crate::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a table as CSV: `date,<columns...>`, missing values as empty cells.
pub fn write_table<W: Write>(table: &SeriesTable, writer: W) -> Result<()> {
    write_rows(table.columns(), table.rows().iter(), writer)
}

/// Write raw prices in date order, gaps left as empty cells.
pub fn write_raw_prices<W: Write>(raw: &RawPrices, writer: W) -> Result<()> {
    let mut rows: Vec<&Row> = raw.rows().iter().collect();
    rows.sort_by_key(|r| r.date);
    write_rows(raw.columns(), rows.into_iter(), writer)
}

fn write_rows<'a, W: Write>(
    columns: &[String],
    rows: impl Iterator<Item = &'a Row>,
    writer: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("date");
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.extend(row.values.iter().map(|v| cell(*v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the metrics summary as CSV, one row per instrument.
pub fn write_summary<W: Write>(summary: &MetricsSummary, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "instrument",
        "annual_return",
        "annual_vol",
        "sharpe",
        "total_return",
        "max_drawdown",
    ])?;

    for record in summary.records() {
        writer.write_record([
            record.instrument.clone(),
            cell(record.annual_return),
            cell(record.annual_vol),
            cell(record.sharpe),
            cell(record.total_return),
            cell(record.max_drawdown),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Save a table to `path`, creating parent directories.
pub fn save_table(table: &SeriesTable, path: &Path) -> Result<()> {
    let file = create(path)?;
    write_table(table, file)?;
    tracing::info!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Save a metrics summary to `path`, creating parent directories.
pub fn save_summary(summary: &MetricsSummary, path: &Path) -> Result<()> {
    let file = create(path)?;
    write_summary(summary, file)?;
    tracing::info!(
        "Saved summary for {} instruments to {}",
        summary.len(),
        path.display()
    );
    Ok(())
}

/// Save raw prices to `path`, creating parent directories.
pub fn save_raw_prices(raw: &RawPrices, path: &Path) -> Result<()> {
    let file = create(path)?;
    write_raw_prices(raw, file)?;
    tracing::info!("Saved {} raw rows to {}", raw.len(), path.display());
    Ok(())
}

/// Write the raw input and every report table into `dir`. Returns the files written.
pub fn export_report(
    raw: &RawPrices,
    report: &AnalysisReport,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let tables = [
        ("clean_prices.csv", &report.prices),
        ("daily_returns.csv", &report.daily_returns),
        ("cumulative_returns.csv", &report.cumulative_returns),
        ("rolling_volatility.csv", &report.rolling_volatility),
        ("rolling_mean_return.csv", &report.rolling_mean_return),
        ("drawdowns.csv", &report.drawdowns),
    ];

    let mut written = Vec::with_capacity(tables.len() + 2);

    let path = dir.join("raw_prices.csv");
    save_raw_prices(raw, &path)?;
    written.push(path);

    for (name, table) in tables {
        let path = dir.join(name);
        save_table(table, &path)?;
        written.push(path);
    }

    let path = dir.join("summary_stats.csv");
    save_summary(&report.summary, &path)?;
    written.push(path);

    Ok(written)
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
