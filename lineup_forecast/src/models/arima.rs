//! ARIMA strategy

use crate::error::Result;
use crate::models::{fit_model, FitOutcome, FitStrategy, ModelFitFailure, ModelType};
use forecast_math::ArimaModel;

/// ARIMA(p,d,q) strategy, ARIMA(1,1,1) in the standard chain
#[derive(Debug, Clone)]
pub struct ArimaStrategy {
    model: ArimaModel,
}

impl ArimaStrategy {
    /// Create a new ARIMA strategy
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        Ok(Self {
            model: ArimaModel::new(p, d, q)?,
        })
    }
}

impl FitStrategy for ArimaStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::Arima
    }

    fn fit_and_forecast(
        &self,
        values: &[f64],
        horizon: usize,
    ) -> std::result::Result<FitOutcome, ModelFitFailure> {
        fit_model(&self.model, ModelType::Arima, values, horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    #[test]
    fn test_invalid_order() {
        assert!(matches!(
            ArimaStrategy::new(3, 1, 1),
            Err(ForecastError::MathError(_))
        ));
    }

    #[test]
    fn test_fit_and_forecast() {
        let strategy = ArimaStrategy::new(1, 1, 1).unwrap();
        let values = [20.0, 22.0, 21.0, 24.0, 23.0, 26.0, 25.0, 28.0];
        let outcome = strategy.fit_and_forecast(&values, 6).unwrap();
        assert_eq!(outcome.values.len(), 6);
        assert!(!outcome.residuals.is_empty());
    }

    #[test]
    fn test_too_short_for_order() {
        let strategy = ArimaStrategy::new(1, 1, 1).unwrap();
        let failure = strategy.fit_and_forecast(&[1.0, 2.0, 3.0], 2).unwrap_err();
        assert_eq!(failure.model, ModelType::Arima);
    }
}
