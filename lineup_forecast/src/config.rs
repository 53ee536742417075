//! Forecast run configuration

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for a forecast generation run.
///
/// Every field has a default, so a JSON file only needs to list what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future months to forecast
    pub horizon: usize,
    /// Calendar year of the first forecast month. `None` picks the year after
    /// the latest historical observation.
    pub forecast_year: Option<i32>,
    /// Fraction of the history used for training during backtesting
    pub train_ratio: f64,
    /// Below this many observations the backtest is skipped and a plain mean is served
    pub min_backtest_points: usize,
    /// Below this many observations the fallback engine serves a plain mean
    pub min_model_points: usize,
    /// Trailing window of the last-resort moving average
    pub moving_average_window: usize,
    /// Forecast lineups on the rayon thread pool
    pub parallel: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 12,
            forecast_year: None,
            train_ratio: 0.8,
            min_backtest_points: 6,
            min_model_points: 3,
            moving_average_window: 3,
            parallel: true,
        }
    }
}

impl ForecastConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style override of the horizon
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Builder-style override of the forecast year
    pub fn with_forecast_year(mut self, year: i32) -> Self {
        self.forecast_year = Some(year);
        self
    }

    /// Check that the settings describe a runnable forecast
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least one month".to_string(),
            ));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got {}",
                self.train_ratio
            )));
        }
        if self.moving_average_window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Moving average window must be positive".to_string(),
            ));
        }
        if self.min_model_points == 0 {
            return Err(ForecastError::InvalidParameter(
                "Minimum model points must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
