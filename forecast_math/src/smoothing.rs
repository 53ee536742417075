//! Additive-trend exponential smoothing (Holt's linear method)
//!
//! The level and trend recursions are
//!
//! ```text
//! level_t = alpha * y_t + (1 - alpha) * (level_{t-1} + trend_{t-1})
//! trend_t = beta * (level_t - level_{t-1}) + (1 - beta) * trend_{t-1}
//! ```
//!
//! and the `h`-step forecast is `level_n + h * trend_n`. The smoothing
//! parameters are chosen by a grid search minimising the in-sample sum of
//! squared one-step-ahead errors.

use crate::{ensure_finite, ForecastModel, MathError, Result, TrainedModel};
use tracing::trace;

/// Holt linear trend model specification
#[derive(Debug, Clone)]
pub struct HoltLinear {
    name: String,
    /// Number of candidate values tried for each smoothing parameter
    grid_steps: usize,
}

/// Holt linear trend model fitted to a series
#[derive(Debug, Clone)]
pub struct TrainedHolt {
    name: String,
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    residuals: Vec<f64>,
}

/// State left after running the recursions over a series
struct HoltPass {
    sse: f64,
    level: f64,
    trend: f64,
    residuals: Vec<f64>,
}

impl HoltLinear {
    /// Smallest series the model will fit
    pub const MIN_OBSERVATIONS: usize = 3;

    /// Create a model with the default parameter grid (steps of 0.05)
    pub fn new() -> Self {
        Self {
            name: "Holt Linear (additive trend)".to_string(),
            grid_steps: 19,
        }
    }

    /// Create a model searching `grid_steps` evenly spaced values in (0, 1)
    pub fn with_grid(grid_steps: usize) -> Result<Self> {
        if grid_steps == 0 {
            return Err(MathError::InvalidInput(
                "Grid must contain at least one candidate".to_string(),
            ));
        }

        Ok(Self {
            grid_steps,
            ..Self::new()
        })
    }

    fn candidates(&self) -> impl Iterator<Item = f64> + Clone {
        let steps = self.grid_steps;
        (1..=steps).map(move |i| i as f64 / (steps + 1) as f64)
    }

    /// Run the level/trend recursions, recording one-step-ahead errors
    fn run(values: &[f64], alpha: f64, beta: f64) -> HoltPass {
        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut residuals = Vec::with_capacity(values.len() - 1);

        for &y in &values[1..] {
            let predicted = level + trend;
            residuals.push(y - predicted);

            let new_level = alpha * y + (1.0 - alpha) * predicted;
            trend = beta * (new_level - level) + (1.0 - beta) * trend;
            level = new_level;
        }

        HoltPass {
            sse: residuals.iter().map(|e| e * e).sum(),
            level,
            trend,
            residuals,
        }
    }
}

impl Default for HoltLinear {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for HoltLinear {
    type Trained = TrainedHolt;

    fn fit(&self, values: &[f64]) -> Result<TrainedHolt> {
        if values.len() < Self::MIN_OBSERVATIONS {
            return Err(MathError::InsufficientData(format!(
                "Holt linear smoothing needs at least {} observations, got {}",
                Self::MIN_OBSERVATIONS,
                values.len()
            )));
        }
        ensure_finite(values)?;

        let mut best: Option<(f64, f64, HoltPass)> = None;
        for alpha in self.candidates() {
            for beta in self.candidates() {
                let pass = Self::run(values, alpha, beta);
                if !pass.sse.is_finite() {
                    continue;
                }
                let better = best.as_ref().map_or(true, |(_, _, b)| pass.sse < b.sse);
                if better {
                    best = Some((alpha, beta, pass));
                }
            }
        }

        let (alpha, beta, pass) = best.ok_or_else(|| {
            MathError::ConvergenceFailure("No smoothing parameters gave a finite fit".to_string())
        })?;

        if !pass.level.is_finite() || !pass.trend.is_finite() {
            return Err(MathError::ConvergenceFailure(
                "Fitted level or trend is not finite".to_string(),
            ));
        }

        trace!(alpha, beta, sse = pass.sse, "holt parameters selected");

        Ok(TrainedHolt {
            name: self.name.clone(),
            alpha,
            beta,
            level: pass.level,
            trend: pass.trend,
            residuals: pass.residuals,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedHolt {
    /// Selected level smoothing parameter
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Selected trend smoothing parameter
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Final level
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Final trend (per period)
    pub fn trend(&self) -> f64 {
        self.trend
    }
}

impl TrainedModel for TrainedHolt {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let values: Vec<f64> = (1..=horizon)
            .map(|h| self.level + h as f64 * self.trend)
            .collect();

        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::CalculationError(
                "Forecast produced non-finite values".to_string(),
            ));
        }

        Ok(values)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}
