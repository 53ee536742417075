//! ARIMA models for time series forecasting
//!
//! Supports orders up to ARIMA(1,1,1). Coefficients are estimated by
//! minimising the conditional sum of squares (CSS) over a grid of stationary
//! and invertible values. With `d = 0` the series mean is removed before
//! fitting and added back to the forecast; with `d = 1` no drift term is
//! fitted.

use crate::{ensure_finite, statistics, ForecastModel, MathError, Result, TrainedModel};
use tracing::trace;

/// Coefficient grid for the AR and MA terms: -0.95, -0.90, ..., 0.95
const COEFFICIENT_GRID: usize = 39;

/// ARIMA model specification (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
}

/// ARIMA model fitted to a series
#[derive(Debug, Clone)]
pub struct TrainedArima {
    name: String,
    d: usize,
    phi: f64,
    theta: f64,
    /// Mean removed from the (differenced) series
    mean: f64,
    /// Last centred value of the (differenced) series
    last_centred: f64,
    /// Last innovation
    last_error: f64,
    /// Last observation of the undifferenced series
    last_observation: f64,
    residuals: Vec<f64>,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p > 1 || d > 1 || q > 1 {
            return Err(MathError::InvalidInput(format!(
                "ARIMA({},{},{}) is not supported; orders are limited to 1",
                p, d, q
            )));
        }

        Ok(Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
        })
    }

    /// Minimum number of observations needed to fit this order
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 2
    }

    fn grid(order: usize) -> Vec<f64> {
        if order == 0 {
            return vec![0.0];
        }
        (0..COEFFICIENT_GRID)
            .map(|i| -0.95 + i as f64 * 0.05)
            .collect()
    }

    /// Conditional sum of squares for the given coefficients
    fn css(z: &[f64], phi: f64, theta: f64) -> (f64, Vec<f64>) {
        let mut errors = Vec::with_capacity(z.len());
        let mut prev_error = 0.0;

        for t in 1..z.len() {
            let predicted = phi * z[t - 1] + theta * prev_error;
            let error = z[t] - predicted;
            errors.push(error);
            prev_error = error;
        }

        (errors.iter().map(|e| e * e).sum(), errors)
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArima;

    fn fit(&self, values: &[f64]) -> Result<TrainedArima> {
        if values.len() < self.min_observations() {
            return Err(MathError::InsufficientData(format!(
                "Insufficient data for {}. Need at least {} observations.",
                self.name,
                self.min_observations()
            )));
        }
        ensure_finite(values)?;

        let working: Vec<f64> = if self.d == 1 {
            values.windows(2).map(|w| w[1] - w[0]).collect()
        } else {
            values.to_vec()
        };

        let mean = if self.d == 0 {
            statistics::mean(&working)?
        } else {
            0.0
        };
        let centred: Vec<f64> = working.iter().map(|v| v - mean).collect();

        let mut best: Option<(f64, f64, f64, Vec<f64>)> = None;
        for &phi in &Self::grid(self.p) {
            for &theta in &Self::grid(self.q) {
                let (sse, errors) = Self::css(&centred, phi, theta);
                if !sse.is_finite() {
                    continue;
                }
                if best.as_ref().map_or(true, |(_, _, b, _)| sse < *b) {
                    best = Some((phi, theta, sse, errors));
                }
            }
        }

        let (phi, theta, sse, residuals) = best.ok_or_else(|| {
            MathError::ConvergenceFailure(format!("{} found no finite CSS estimate", self.name))
        })?;

        trace!(phi, theta, sse, model = %self.name, "arima coefficients selected");

        let last_centred = centred.last().copied().unwrap_or_default();
        let last_error = residuals.last().copied().unwrap_or_default();
        let last_observation = values.last().copied().unwrap_or_default();

        Ok(TrainedArima {
            name: self.name.clone(),
            d: self.d,
            phi,
            theta,
            mean,
            last_centred,
            last_error,
            last_observation,
            residuals,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArima {
    /// Fitted AR coefficient (0 when p = 0)
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Fitted MA coefficient (0 when q = 0)
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl TrainedModel for TrainedArima {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut forecasts = Vec::with_capacity(horizon);
        let mut previous = self.last_centred;
        let mut level = self.last_observation;

        for step in 0..horizon {
            // The MA term only contributes to the first step
            let innovation = if step == 0 { self.theta * self.last_error } else { 0.0 };
            let centred = self.phi * previous + innovation;
            previous = centred;

            let value = if self.d == 1 {
                level += centred + self.mean;
                level
            } else {
                centred + self.mean
            };
            forecasts.push(value);
        }

        if forecasts.iter().any(|v| !v.is_finite()) {
            return Err(MathError::CalculationError(format!(
                "{} forecast produced non-finite values",
                self.name
            )));
        }

        Ok(forecasts)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}
