// stock-dashboard entry point: load prices, run the pipeline, print the result
use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::analysis::correlation_matrix;
use engine::config::settings::DashboardSettings;
use engine::data::csv_parser::{CsvParser, DataFormat};
use engine::data::market_data::MarketDataStore;
use engine::derive_batch;
use shared::models::{CorrelationMatrix, DerivedSeries, IndicatorSpec, PipelineParams, TimeSeries, Timeframe};

#[derive(Parser, Debug)]
#[command(name = "stock-dashboard")]
#[command(about = "Resample stock prices and compute moving averages, RSI and correlations")]
struct Cli {
    /// CSV file with price data
    #[arg(value_name = "DATA_FILE")]
    data_file: PathBuf,

    /// Settings JSON; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<DataFormat>,

    /// daily, weekly or monthly (also d/w/m)
    #[arg(long, value_parser = parse_timeframe)]
    timeframe: Option<Timeframe>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// SMA window, repeatable. Any indicator flag replaces the configured indicators
    #[arg(long = "sma", value_name = "WINDOW")]
    sma: Vec<usize>,

    /// EMA span, repeatable
    #[arg(long = "ema", value_name = "SPAN")]
    ema: Vec<usize>,

    /// RSI window, repeatable
    #[arg(long = "rsi", value_name = "WINDOW")]
    rsi: Vec<usize>,

    /// Comma-separated symbols to compare (default: every loaded symbol)
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Also compute the close-price correlation matrix
    #[arg(long)]
    correlation: bool,

    /// Print JSON instead of a preview table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    series: BTreeMap<String, DerivedSeries>,
    errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation: Option<CorrelationMatrix>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => DashboardSettings::load_from_file(path)?,
        None => DashboardSettings::load_default()?,
    };
    let params = build_params(&cli, &settings)?;
    info!(
        timeframe = %params.timeframe,
        indicators = params.indicators.len(),
        "Starting stock dashboard pipeline"
    );

    let parser = CsvParser::new(settings.data.csv_options()?);
    let format = cli.format.unwrap_or(settings.data.format);
    let loaded = parser
        .load(&cli.data_file, format)
        .with_context(|| format!("Failed to load '{}'", cli.data_file.display()))?;

    let mut store = MarketDataStore::new();
    for series in loaded {
        store.add_series(series);
    }
    if store.is_empty() {
        bail!("'{}' contains no price data", cli.data_file.display());
    }

    let symbols = select_symbols(&cli.symbols, &store, settings.max_compare_symbols)?;
    // The pipeline applies the date range itself; hand it the full daily history.
    let batch = store.to_batch(&symbols, &Default::default());
    let results = derive_batch(&batch, &params);

    let mut report = Report { series: BTreeMap::new(), errors: BTreeMap::new(), correlation: None };
    for (symbol, result) in results {
        match result {
            Ok(derived) => {
                report.series.insert(symbol, derived);
            }
            Err(e) => {
                report.errors.insert(symbol, e.to_string());
            }
        }
    }
    if report.series.is_empty() {
        bail!("No instrument produced a series ({} failed)", report.errors.len());
    }

    if cli.correlation {
        let resampled: Vec<TimeSeries> = report
            .series
            .values()
            .map(|d| TimeSeries::new(d.symbol.clone(), d.bars.clone()))
            .collect();
        report.correlation = Some(correlation_matrix(&resampled));
    }

    info!(ok = report.series.len(), failed = report.errors.len(), "Pipeline finished");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_preview(&report, settings.preview_rows);
    }
    Ok(())
}

fn parse_timeframe(s: &str) -> std::result::Result<Timeframe, String> {
    s.parse::<Timeframe>().map_err(|e| e.to_string())
}

/// Settings first, then command line overrides.
fn build_params(cli: &Cli, settings: &DashboardSettings) -> Result<PipelineParams> {
    let mut params = settings.pipeline.clone();

    if let Some(timeframe) = cli.timeframe {
        params.timeframe = timeframe;
    }
    if cli.from.is_some() {
        params.date_range.from = cli.from;
    }
    if cli.to.is_some() {
        params.date_range.to = cli.to;
    }
    if let (Some(from), Some(to)) = (params.date_range.from, params.date_range.to) {
        if from > to {
            bail!("--from {} is after --to {}", from, to);
        }
    }

    let specs: Vec<IndicatorSpec> = cli
        .sma
        .iter()
        .map(|&window| IndicatorSpec::Sma { window })
        .chain(cli.ema.iter().map(|&span| IndicatorSpec::Ema { span }))
        .chain(cli.rsi.iter().map(|&window| IndicatorSpec::Rsi { window }))
        .collect();
    if let Some(spec) = specs.iter().find(|s| s.lookback() == 0) {
        bail!("{} has a lookback of 0", spec);
    }
    if !specs.is_empty() {
        params.indicators = specs.into_iter().collect();
    }
    Ok(params)
}

fn select_symbols(requested: &[String], store: &MarketDataStore, max_compare: usize) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(store.symbols());
    }
    if requested.len() > max_compare {
        bail!("At most {} symbols can be compared, got {}", max_compare, requested.len());
    }
    Ok(requested.to_vec())
}

fn print_preview(report: &Report, rows: usize) {
    for derived in report.series.values() {
        println!("== {} ({}, {} bars)", derived.symbol, derived.timeframe, derived.bars.len());

        let mut header = format!("{:<10} {:>10} {:>10} {:>10} {:>10} {:>12}", "Date", "Open", "High", "Low", "Close", "Volume");
        for indicator in &derived.indicators {
            header.push_str(&format!(" {:>10}", indicator.name));
        }
        println!("{}", header);

        let start = derived.bars.len().saturating_sub(rows);
        for (i, bar) in derived.bars.iter().enumerate().skip(start) {
            let mut line = format!(
                "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
                bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
            );
            for indicator in &derived.indicators {
                match indicator.values.get(i).copied().flatten() {
                    Some(v) => line.push_str(&format!(" {:>10.2}", v)),
                    None => line.push_str(&format!(" {:>10}", "-")),
                }
            }
            println!("{}", line);
        }
        println!();
    }

    for (symbol, error) in &report.errors {
        println!("!! {}: {}", symbol, error);
    }

    if let Some(matrix) = &report.correlation {
        println!("== Correlation");
        let mut header = format!("{:<14}", "");
        for symbol in &matrix.symbols {
            header.push_str(&format!(" {:>14}", symbol));
        }
        println!("{}", header);
        for (symbol, row) in matrix.symbols.iter().zip(&matrix.values) {
            let mut line = format!("{:<14}", symbol);
            for value in row {
                match value {
                    Some(r) => line.push_str(&format!(" {:>14.3}", r)),
                    None => line.push_str(&format!(" {:>14}", "-")),
                }
            }
            println!("{}", line);
        }
    }
}
