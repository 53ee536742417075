//! Error types for the lineup_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the lineup_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The lineup has no historical actuals, so not even a mean can be taken
    #[error("No historical data for lineup: {0}")]
    NoDataForEntity(String),

    /// Every lineup in a generation run failed
    #[error("No forecasts produced: all {attempted} lineups failed")]
    NoForecastsProduced { attempted: usize },

    /// A query ran before any successful generation run
    #[error("Combined data not available. Generate forecasts first.")]
    StateNotReady,

    /// The derived state exists but holds no rows for the lineup
    #[error("No data found for lineup: {0}")]
    EntityNotFound(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error loading or parsing configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
