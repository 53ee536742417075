//! Forecasting strategies and the fallback chain that selects among them
//!
//! Each strategy implements the narrow fit-and-forecast contract. A
//! [`ModelChain`] tries its strategies in order and serves the first one that
//! succeeds; failures are returned as typed [`ModelFitFailure`] values rather
//! than unwinding through the caller.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use forecast_math::{statistics, ForecastModel, MathError, TrainedModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub mod arima;
pub mod exponential_smoothing;
pub mod moving_average;

pub use self::arima::ArimaStrategy;
pub use self::exponential_smoothing::EtsStrategy;
pub use self::moving_average::TrailingMeanStrategy;

/// Which model produced a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "ETS")]
    Ets,
    #[serde(rename = "ARIMA")]
    Arima,
    #[serde(rename = "moving_average")]
    MovingAverage,
    #[serde(rename = "simple_mean")]
    SimpleMean,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Ets => "ETS",
            ModelType::Arima => "ARIMA",
            ModelType::MovingAverage => "moving_average",
            ModelType::SimpleMean => "simple_mean",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy that could not produce a forecast
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{model} fit failed: {reason}")]
pub struct ModelFitFailure {
    pub model: ModelType,
    pub reason: String,
}

impl ModelFitFailure {
    pub fn new(model: ModelType, reason: impl fmt::Display) -> Self {
        Self {
            model,
            reason: reason.to_string(),
        }
    }
}

/// Output of a successful fit
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Point forecast, one value per horizon step
    pub values: Vec<f64>,
    /// In-sample one-step-ahead errors (empty when the model has none)
    pub residuals: Vec<f64>,
}

/// Common fit-and-forecast capability of every strategy in a chain
pub trait FitStrategy: fmt::Debug + Send + Sync {
    /// Model type reported when this strategy is served
    fn model_type(&self) -> ModelType;

    /// Fit the values (oldest first) and forecast `horizon` steps
    fn fit_and_forecast(
        &self,
        values: &[f64],
        horizon: usize,
    ) -> std::result::Result<FitOutcome, ModelFitFailure>;
}

/// Fit a math-crate model and forecast, mapping its errors to a fit failure
pub(crate) fn fit_model<M: ForecastModel>(
    model: &M,
    model_type: ModelType,
    values: &[f64],
    horizon: usize,
) -> std::result::Result<FitOutcome, ModelFitFailure> {
    let failure = |err: MathError| ModelFitFailure::new(model_type, err);

    let trained = model.fit(values).map_err(failure)?;
    let forecast = trained.forecast(horizon).map_err(failure)?;

    Ok(FitOutcome {
        values: forecast,
        residuals: trained.residuals().to_vec(),
    })
}

/// Forecast served by a [`ModelChain`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChainForecast {
    /// Point forecast, one value per horizon step
    pub values: Vec<f64>,
    /// Model that produced the values
    pub model_type: ModelType,
    /// Residuals of the serving model's fit
    pub residuals: Vec<f64>,
    /// Strategies that were tried and failed before the serving one
    pub failures: Vec<ModelFitFailure>,
}

/// Ordered fallback chain of forecasting strategies.
///
/// Series shorter than `min_points` are forecast by their mean. Longer ones
/// are handed to each strategy in turn; the first success is clamped to be
/// non-negative and served.
#[derive(Debug)]
pub struct ModelChain {
    strategies: Vec<Box<dyn FitStrategy>>,
    min_points: usize,
}

impl ModelChain {
    /// Create a chain from explicit strategies
    pub fn new(strategies: Vec<Box<dyn FitStrategy>>, min_points: usize) -> Result<Self> {
        if strategies.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "A model chain needs at least one strategy".to_string(),
            ));
        }

        Ok(Self {
            strategies,
            min_points,
        })
    }

    /// ETS, then ARIMA(1,1,1), then a trailing mean
    pub fn standard(config: &ForecastConfig) -> Result<Self> {
        Self::new(
            vec![
                Box::new(EtsStrategy::new()),
                Box::new(ArimaStrategy::new(1, 1, 1)?),
                Box::new(TrailingMeanStrategy::new(config.moving_average_window)?),
            ],
            config.min_model_points,
        )
    }

    /// Series length from which the strategies are tried and outputs clamped
    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Model types in the order they are tried
    pub fn model_types(&self) -> Vec<ModelType> {
        self.strategies.iter().map(|s| s.model_type()).collect()
    }

    /// Forecast a dated series; the points are put in date order first
    pub fn forecast(&self, series: &[(NaiveDate, f64)], horizon: usize) -> Result<ChainForecast> {
        let mut ordered = series.to_vec();
        ordered.sort_by_key(|(date, _)| *date);
        let values: Vec<f64> = ordered.into_iter().map(|(_, v)| v).collect();
        self.forecast_values(&values, horizon)
    }

    /// Forecast a series of values, oldest first.
    ///
    /// The chain has no lineup to name, so an empty series is a `DataError`;
    /// callers that forecast a lineup check for empty history first and report
    /// `NoDataForEntity` themselves.
    pub fn forecast_values(&self, values: &[f64], horizon: usize) -> Result<ChainForecast> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot forecast an empty series".to_string(),
            ));
        }

        if values.len() < self.min_points {
            let mean = statistics::mean(values)?;
            return Ok(ChainForecast {
                values: vec![mean; horizon],
                model_type: ModelType::SimpleMean,
                residuals: Vec::new(),
                failures: Vec::new(),
            });
        }

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let outcome = strategy
                .fit_and_forecast(values, horizon)
                .and_then(|outcome| check_outcome(strategy.model_type(), outcome, horizon));

            match outcome {
                Ok(outcome) => {
                    return Ok(ChainForecast {
                        values: outcome.values.into_iter().map(|v| v.max(0.0)).collect(),
                        model_type: strategy.model_type(),
                        residuals: outcome.residuals,
                        failures,
                    });
                }
                Err(failure) => {
                    debug!(model = %failure.model, reason = %failure.reason, "falling back");
                    failures.push(failure);
                }
            }
        }

        Err(ForecastError::DataError(format!(
            "Every model in the chain failed: {}",
            failures
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        )))
    }
}

/// Reject outcomes of the wrong length or with non-finite values
fn check_outcome(
    model: ModelType,
    outcome: FitOutcome,
    horizon: usize,
) -> std::result::Result<FitOutcome, ModelFitFailure> {
    if outcome.values.len() != horizon {
        return Err(ModelFitFailure::new(
            model,
            format!(
                "returned {} values for a horizon of {}",
                outcome.values.len(),
                horizon
            ),
        ));
    }
    if outcome.values.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitFailure::new(model, "forecast contains non-finite values"));
    }
    Ok(outcome)
}
