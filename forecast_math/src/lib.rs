//! # Forecast Math
//!
//! Numeric building blocks for monthly forecasting.
//! This crate provides descriptive statistics and the two model families the
//! forecasting pipeline fits: additive-trend exponential smoothing (Holt's
//! linear method) and low-order ARIMA estimated by conditional sum of squares.

use std::fmt::Debug;
use thiserror::Error;

pub mod arima;
pub mod smoothing;
pub mod statistics;

pub use crate::arima::{ArimaModel, TrainedArima};
pub use crate::smoothing::{HoltLinear, TrainedHolt};

/// Errors that can occur while computing statistics or fitting models
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Model failed to converge: {0}")]
    ConvergenceFailure(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// A model fitted to a series, able to extrapolate it
pub trait TrainedModel: Debug {
    /// Forecast `horizon` steps past the end of the fitted series
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;

    /// One-step-ahead in-sample errors of the fit
    fn residuals(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;
}

/// A model specification that can be fitted to a series of values
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedModel;

    /// Fit the model to the values, oldest first
    fn fit(&self, values: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Reject series containing NaN or infinite values
pub(crate) fn ensure_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(MathError::InvalidInput(format!(
            "Non-finite value at position {}",
            idx
        ))),
        None => Ok(()),
    }
}
