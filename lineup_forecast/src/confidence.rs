//! Approximate 95% intervals around point forecasts

use crate::models::ModelType;
use forecast_math::statistics;

/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.96;

/// Share of the series standard deviation used when ETS residuals are unusable
const ETS_FALLBACK_SCALE: f64 = 0.1;
/// Share of the series standard deviation used for ARIMA forecasts
const ARIMA_SCALE: f64 = 0.15;
/// Share of the mean used when a single point leaves the deviation undefined
const SINGLE_POINT_SCALE: f64 = 0.1;

/// Where the interval width comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispersion<'a> {
    /// Residuals of a fitted model, with the full history as fallback
    Residuals {
        residuals: &'a [f64],
        history: &'a [f64],
    },
    /// A fraction of the history's standard deviation
    ScaledHistory { history: &'a [f64], scale: f64 },
    /// The history's standard deviation, or a fraction of its mean for a single point
    History(&'a [f64]),
}

impl<'a> Dispersion<'a> {
    /// Dispersion rule for a served model.
    ///
    /// `training_residuals` are the residuals of the backtest's training fit,
    /// used only when the served model is ETS.
    pub fn for_model(
        model_type: ModelType,
        training_residuals: &'a [f64],
        history: &'a [f64],
    ) -> Self {
        match model_type {
            ModelType::Ets => Dispersion::Residuals {
                residuals: training_residuals,
                history,
            },
            ModelType::Arima => Dispersion::ScaledHistory {
                history,
                scale: ARIMA_SCALE,
            },
            ModelType::MovingAverage | ModelType::SimpleMean => Dispersion::History(history),
        }
    }

    /// Standard deviation the interval is built on
    pub fn std_dev(&self) -> f64 {
        match *self {
            Dispersion::Residuals { residuals, history } => statistics::std_dev(residuals)
                .unwrap_or_else(|| history_std(history) * ETS_FALLBACK_SCALE),
            Dispersion::ScaledHistory { history, scale } => history_std(history) * scale,
            Dispersion::History(history) => statistics::std_dev(history).unwrap_or_else(|| {
                statistics::mean(history).unwrap_or_default().abs() * SINGLE_POINT_SCALE
            }),
        }
    }

    /// Distance from the point forecast to either bound
    pub fn half_width(&self) -> f64 {
        Z_95 * self.std_dev()
    }
}

fn history_std(history: &[f64]) -> f64 {
    statistics::std_dev(history).unwrap_or_default()
}

/// Symmetric bounds around each forecast value; the lower bound is floored at zero
pub fn bounds(forecast: &[f64], half_width: f64) -> (Vec<f64>, Vec<f64>) {
    forecast
        .iter()
        .map(|v| ((v - half_width).max(0.0), v + half_width))
        .unzip()
}
