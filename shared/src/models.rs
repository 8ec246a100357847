use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily (or aggregated) OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self { date, open, high, low, close, volume }
    }

    /// Bar where every price field is the close. Used for close-only sources.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0)
    }
}

/// Bars for a single instrument, sorted by date with no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl TimeSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self { symbol: symbol.into(), bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "1d" | "daily" => Ok(Timeframe::Daily),
            "w" | "1w" | "weekly" => Ok(Timeframe::Weekly),
            "m" | "1m" | "monthly" => Ok(Timeframe::Monthly),
            other => Err(anyhow!("Unknown timeframe '{}' (expected daily, weekly or monthly)", other)),
        }
    }
}

/// A single indicator request. Each variant carries its own lookback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IndicatorSpec {
    Sma { window: usize },
    Ema { span: usize },
    Rsi { window: usize },
}

impl IndicatorSpec {
    /// Window for SMA/RSI, span for EMA.
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorSpec::Sma { window } | IndicatorSpec::Rsi { window } => window,
            IndicatorSpec::Ema { span } => span,
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSpec::Sma { window } => write!(f, "SMA({})", window),
            IndicatorSpec::Ema { span } => write!(f, "EMA({})", span),
            IndicatorSpec::Rsi { window } => write!(f, "RSI({})", window),
        }
    }
}

/// Set of enabled indicators, kept in the order they were switched on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<IndicatorSpec>", into = "Vec<IndicatorSpec>")]
pub struct IndicatorSelection {
    specs: Vec<IndicatorSpec>,
}

impl IndicatorSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `spec`. Returns false if it was already enabled.
    pub fn enable(&mut self, spec: IndicatorSpec) -> bool {
        if self.is_enabled(&spec) {
            return false;
        }
        self.specs.push(spec);
        true
    }

    /// Disables `spec`. Returns false if it was not enabled.
    pub fn disable(&mut self, spec: &IndicatorSpec) -> bool {
        let before = self.specs.len();
        self.specs.retain(|s| s != spec);
        self.specs.len() != before
    }

    /// Flips `spec` and returns whether it is enabled afterwards.
    pub fn toggle(&mut self, spec: IndicatorSpec) -> bool {
        if self.disable(&spec) {
            false
        } else {
            self.specs.push(spec);
            true
        }
    }

    pub fn is_enabled(&self, spec: &IndicatorSpec) -> bool {
        self.specs.contains(spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl From<Vec<IndicatorSpec>> for IndicatorSelection {
    fn from(specs: Vec<IndicatorSpec>) -> Self {
        specs.into_iter().collect()
    }
}

impl From<IndicatorSelection> for Vec<IndicatorSpec> {
    fn from(selection: IndicatorSelection) -> Self {
        selection.specs
    }
}

impl FromIterator<IndicatorSpec> for IndicatorSelection {
    fn from_iter<I: IntoIterator<Item = IndicatorSpec>>(iter: I) -> Self {
        let mut selection = IndicatorSelection::new();
        for spec in iter {
            selection.enable(spec);
        }
        selection
    }
}

/// A derived indicator column. `values[i]` lines up with `bars[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub parameters: serde_json::Value,
    pub values: Vec<Option<f64>>,
}

/// Inclusive date filter; `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |start| date >= start) && self.to.map_or(true, |end| date <= end)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Everything the pipeline needs to know about the user's current choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub indicators: IndicatorSelection,
    #[serde(default)]
    pub date_range: DateRange,
}

/// Resampled bars plus the requested indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
    pub indicators: Vec<Indicator>,
}

impl DerivedSeries {
    pub fn indicator(&self, name: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.name == name)
    }
}

/// Pairwise close-price correlations; `values[i][j]` pairs `symbols[i]` with `symbols[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.values[i][j]
    }
}
