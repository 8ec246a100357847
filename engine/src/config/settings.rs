// Dashboard settings, loaded from the embedded default.json or a user file
use std::path::Path;

use serde::Deserialize;
use shared::models::PipelineParams;

use crate::data::csv_parser::{CsvOptions, DataFormat};
use crate::error::EngineError;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.json");

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub version: String,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub pipeline: PipelineParams,
    #[serde(default = "default_max_compare_symbols")]
    pub max_compare_symbols: usize,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    pub format: DataFormat,
    pub delimiter: String, // Should be char, but JSON string is easier
    pub date_format: String,
    pub default_symbol: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        let csv = CsvOptions::default();
        Self {
            format: DataFormat::default(),
            delimiter: (csv.delimiter as char).to_string(),
            date_format: csv.date_format,
            default_symbol: csv.default_symbol,
        }
    }
}

impl DataSettings {
    pub fn csv_options(&self) -> Result<CsvOptions, EngineError> {
        let delimiter = match self.delimiter.as_bytes() {
            [b] => *b,
            _ => {
                return Err(EngineError::ConfigError(format!(
                    "CSV delimiter must be a single ASCII character, got '{}'",
                    self.delimiter
                )))
            }
        };
        Ok(CsvOptions {
            delimiter,
            date_format: self.date_format.clone(),
            default_symbol: self.default_symbol.clone(),
        })
    }
}

fn default_max_compare_symbols() -> usize {
    5
}

fn default_preview_rows() -> usize {
    20
}

impl DashboardSettings {
    pub fn load_default() -> Result<Self, EngineError> {
        Self::from_json(DEFAULT_CONFIG)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), version = %settings.version, "Loaded settings file");
        Ok(settings)
    }

    pub fn from_json(contents: &str) -> Result<Self, EngineError> {
        let settings: DashboardSettings = serde_json::from_str(contents)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.data.csv_options()?;
        if self.max_compare_symbols == 0 {
            return Err(EngineError::ConfigError("max_compare_symbols must be at least 1".to_string()));
        }
        if let Some(spec) = self.pipeline.indicators.iter().find(|s| s.lookback() == 0) {
            return Err(EngineError::ConfigError(format!("{} has a lookback of 0", spec)));
        }
        if let (Some(from), Some(to)) = (self.pipeline.date_range.from, self.pipeline.date_range.to) {
            if from > to {
                return Err(EngineError::ConfigError(format!("Date range starts ({}) after it ends ({})", from, to)));
            }
        }
        Ok(())
    }
}
