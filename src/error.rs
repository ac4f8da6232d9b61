//! Error types for the forecasting pipeline

use crate::models::ModelError;
use thiserror::Error;

/// Errors that can occur while loading data, training, or exporting results
#[derive(Error, Debug)]
pub enum ForecastError {
    /// The input table cannot be turned into lag features
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The positional split left the train or test slice empty
    #[error("Degenerate split: {train} training rows and {test} test rows (both must be non-empty)")]
    DegenerateSplit { train: usize, test: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<calamine::Error> for ForecastError {
    fn from(err: calamine::Error) -> Self {
        ForecastError::Workbook(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ForecastError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ForecastError::Workbook(err.to_string())
    }
}

/// Result type alias for forecasting operations
pub type Result<T> = std::result::Result<T, ForecastError>;
