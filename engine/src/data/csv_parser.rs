use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use shared::models::{Bar, TimeSeries};

use crate::error::EngineError;

type Result<T> = std::result::Result<T, EngineError>;

/// Column layout of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// One row per symbol and date: Symbol,Date,Open,High,Low,Close,Volume
    #[default]
    Long,
    /// One row per date, one close-price column per ticker: Date,RELIANCE.NS,INFY.NS,...
    Wide,
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub date_format: String,
    pub default_symbol: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_format: "%Y-%m-%d".to_string(),
            default_symbol: "UNKNOWN".to_string(),
        }
    }
}

// Cells that mean "no trade that day" in wide exports
const MISSING_MARKERS: [&str; 5] = ["", "nan", "na", "null", "none"];

fn format_error(msg: String) -> EngineError {
    EngineError::CsvDataFormatError(msg)
}

pub struct CsvParser {
    options: CsvOptions,
}

impl CsvParser {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn load(&self, file_path: impl AsRef<Path>, format: DataFormat) -> Result<Vec<TimeSeries>> {
        match format {
            DataFormat::Long => self.load_ohlcv(file_path),
            DataFormat::Wide => self.load_close_matrix(file_path),
        }
    }

    /// Long OHLCV layout. Header names are matched case-insensitively; the
    /// Symbol column is optional and falls back to the default symbol.
    pub fn load_ohlcv(&self, file_path: impl AsRef<Path>) -> Result<Vec<TimeSeries>> {
        let file_path = file_path.as_ref();
        let mut rdr = self.reader(file_path)?;
        let headers = rdr.headers()?.clone();

        let symbol_col = Self::column(&headers, "symbol");
        let date_col = Self::required_column(&headers, "date")?;
        let open_col = Self::required_column(&headers, "open")?;
        let high_col = Self::required_column(&headers, "high")?;
        let low_col = Self::required_column(&headers, "low")?;
        let close_col = Self::required_column(&headers, "close")?;
        let volume_col = Self::required_column(&headers, "volume")?;

        let mut grouped: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| format_error(format!("Error reading CSV record at line {}: {}", line, e)))?;

            let symbol = match symbol_col.and_then(|c| record.get(c)).filter(|s| !s.is_empty()) {
                Some(s) => s.to_string(),
                None => self.options.default_symbol.clone(),
            };
            let date = self.parse_date(Self::field(&record, date_col, "Date", line)?, line)?;
            let bar = Bar {
                date,
                open: self.parse_price(Self::field(&record, open_col, "Open", line)?, "Open", line)?,
                high: self.parse_price(Self::field(&record, high_col, "High", line)?, "High", line)?,
                low: self.parse_price(Self::field(&record, low_col, "Low", line)?, "Low", line)?,
                close: self.parse_price(Self::field(&record, close_col, "Close", line)?, "Close", line)?,
                volume: self.parse_volume(Self::field(&record, volume_col, "Volume", line)?, line)?,
            };
            grouped.entry(symbol).or_default().push(bar);
        }

        let series = Self::into_series(grouped);
        tracing::info!(path = %file_path.display(), instruments = series.len(), "Loaded OHLCV CSV");
        Ok(series)
    }

    /// Wide close-price layout, one column per ticker. Blank or NaN cells
    /// leave the day out for that ticker.
    pub fn load_close_matrix(&self, file_path: impl AsRef<Path>) -> Result<Vec<TimeSeries>> {
        let file_path = file_path.as_ref();
        let mut rdr = self.reader(file_path)?;
        let headers = rdr.headers()?.clone();
        let date_col = Self::required_column(&headers, "date")?;

        let tickers: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, name)| *i != date_col && !name.is_empty())
            .map(|(i, name)| (i, name.to_string()))
            .collect();
        if tickers.is_empty() {
            return Err(format_error(format!(
                "No ticker columns found next to 'Date' in '{}'",
                file_path.display()
            )));
        }

        let mut grouped: BTreeMap<String, Vec<Bar>> =
            tickers.iter().map(|(_, t)| (t.clone(), Vec::new())).collect();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| format_error(format!("Error reading CSV record at line {}: {}", line, e)))?;
            let date = self.parse_date(Self::field(&record, date_col, "Date", line)?, line)?;

            for (col, ticker) in &tickers {
                let raw = record.get(*col).unwrap_or("");
                if MISSING_MARKERS.contains(&raw.to_lowercase().as_str()) {
                    continue;
                }
                let close = self.parse_price(raw, ticker, line)?;
                if let Some(bars) = grouped.get_mut(ticker) {
                    bars.push(Bar::from_close(date, close));
                }
            }
        }

        let series = Self::into_series(grouped);
        tracing::info!(path = %file_path.display(), instruments = series.len(), "Loaded close-price matrix CSV");
        Ok(series)
    }

    fn reader(&self, file_path: &Path) -> Result<csv::Reader<std::fs::File>> {
        ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_path(file_path)
            .map_err(|e| {
                tracing::error!(path = %file_path.display(), error = %e, "Failed to open CSV file");
                EngineError::from(e)
            })
    }

    // Sorts each instrument by date and keeps the first row for a repeated date.
    fn into_series(grouped: BTreeMap<String, Vec<Bar>>) -> Vec<TimeSeries> {
        grouped
            .into_iter()
            .map(|(symbol, mut bars)| {
                let before = bars.len();
                bars.sort_by_key(|b| b.date);
                bars.dedup_by_key(|b| b.date);
                if bars.len() != before {
                    tracing::warn!(symbol = %symbol, dropped = before - bars.len(), "Dropped duplicate dates");
                }
                TimeSeries::new(symbol, bars)
            })
            .collect()
    }

    fn column(headers: &StringRecord, name: &str) -> Option<usize> {
        headers.iter().position(|header| header.eq_ignore_ascii_case(name))
    }

    fn required_column(headers: &StringRecord, name: &str) -> Result<usize> {
        Self::column(headers, name).ok_or_else(|| format_error(format!("Missing '{}' column in CSV header", name)))
    }

    fn field<'a>(record: &'a StringRecord, col: usize, name: &str, line: usize) -> Result<&'a str> {
        record
            .get(col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format_error(format!("Missing '{}' field in CSV record at line {}", name, line)))
    }

    fn parse_date(&self, s: &str, line: usize) -> Result<NaiveDate> {
        let format = &self.options.date_format;
        NaiveDate::parse_from_str(s, format)
            .or_else(|full_err| {
                // Timestamps like "2024-01-02 00:00:00": drop trailing
                // whitespace-separated parts, longest prefix first
                s.char_indices()
                    .rev()
                    .filter(|(_, c)| c.is_whitespace())
                    .find_map(|(i, _)| NaiveDate::parse_from_str(s[..i].trim_end(), format).ok())
                    .ok_or(full_err)
            })
            .map_err(|e| format_error(format!("Error parsing 'Date' at line {}: '{}': {}", line, s, e)))
    }

    // With a ',' delimiter a comma inside a quoted number is a thousands
    // separator. Under any other delimiter it may be a decimal comma, which
    // is refused rather than guessed.
    fn normalize_number(&self, s: &str, name: &str, line: usize) -> Result<String> {
        if self.options.delimiter == b',' {
            return Ok(s.replace(',', ""));
        }
        if s.contains(',') {
            return Err(format_error(format!(
                "Error parsing '{}' at line {}: '{}' contains ',' (decimal commas are not supported)",
                name, line, s
            )));
        }
        Ok(s.to_string())
    }

    fn parse_price(&self, s: &str, name: &str, line: usize) -> Result<f64> {
        self.normalize_number(s, name, line)?
            .parse::<f64>()
            .map_err(|e| format_error(format!("Error parsing '{}' at line {}: '{}': {}", name, line, s, e)))
    }

    fn parse_volume(&self, s: &str, line: usize) -> Result<u64> {
        let normalized = self.normalize_number(s, "Volume", line)?;
        if let Ok(v) = normalized.parse::<u64>() {
            return Ok(v);
        }
        // Some exports write volume as a float ("1500.0")
        match normalized.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
            _ => Err(format_error(format!(
                "Error parsing 'Volume' at line {}: '{}' is not a non-negative integer",
                line, s
            ))),
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(CsvOptions::default())
    }
}
