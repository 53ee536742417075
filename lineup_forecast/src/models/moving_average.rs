//! Trailing moving average, the last resort of the fallback chain

use crate::error::{ForecastError, Result};
use crate::models::{FitOutcome, FitStrategy, ModelFitFailure, ModelType};
use forecast_math::statistics;

/// Mean of the last `window` observations, repeated over the horizon
#[derive(Debug, Clone)]
pub struct TrailingMeanStrategy {
    window: usize,
}

impl TrailingMeanStrategy {
    /// Create a new trailing mean strategy
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self { window })
    }

    /// Window size
    pub fn window(&self) -> usize {
        self.window
    }
}

impl FitStrategy for TrailingMeanStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::MovingAverage
    }

    fn fit_and_forecast(
        &self,
        values: &[f64],
        horizon: usize,
    ) -> std::result::Result<FitOutcome, ModelFitFailure> {
        let mean = statistics::tail_mean(values, self.window)
            .map_err(|err| ModelFitFailure::new(ModelType::MovingAverage, err))?;

        Ok(FitOutcome {
            values: vec![mean; horizon],
            residuals: Vec::new(),
        })
    }
}
