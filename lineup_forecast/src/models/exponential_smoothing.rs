//! Additive-trend exponential smoothing strategy

use crate::models::{fit_model, FitOutcome, FitStrategy, ModelFitFailure, ModelType};
use forecast_math::HoltLinear;

/// Exponential smoothing with an additive trend and no seasonal component
#[derive(Debug, Clone, Default)]
pub struct EtsStrategy {
    model: HoltLinear,
}

impl EtsStrategy {
    /// Create the strategy with the default smoothing-parameter search
    pub fn new() -> Self {
        Self {
            model: HoltLinear::new(),
        }
    }

    /// Create the strategy around a specific model specification
    pub fn with_model(model: HoltLinear) -> Self {
        Self { model }
    }
}

impl FitStrategy for EtsStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::Ets
    }

    fn fit_and_forecast(
        &self,
        values: &[f64],
        horizon: usize,
    ) -> Result<FitOutcome, ModelFitFailure> {
        fit_model(&self.model, ModelType::Ets, values, horizon)
    }
}
