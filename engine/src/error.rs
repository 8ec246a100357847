use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    // Zero-length series reaching the resampler, the indicators or the pipeline.
    #[error("Empty input series: {0}")]
    EmptyInputError(String),

    #[error("Series is not strictly ordered by date: {0}")]
    UnorderedInputError(String),

    #[error("Invalid bar: {0}")]
    InvalidBarError(String),

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),

    #[error("Internal processing error: {0}")]
    ProcessingError(String),
}

impl EngineError {
    /// True for errors caused by the shape of the input series rather than by
    /// I/O or configuration. The batch pipeline logs these as warnings.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyInputError(_)
                | EngineError::UnorderedInputError(_)
                | EngineError::InvalidBarError(_)
        )
    }
}
