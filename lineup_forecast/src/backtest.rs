//! Hold-out backtesting and the production forecast of one lineup
//!
//! Diagnostics come from a chronological train/test split; the served forecast
//! comes from a second fit on the full history. The reported accuracy therefore
//! describes the training-split model, not the served one.

use crate::config::ForecastConfig;
use crate::confidence::{self, Dispersion};
use crate::error::{ForecastError, Result};
use crate::metrics::{self, AccuracyReport};
use crate::models::{ChainForecast, ModelChain, ModelType};
use chrono::NaiveDate;
use forecast_math::statistics;
use tracing::{debug, warn};

/// Forecast, bounds and diagnostics of one lineup
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    pub forecast: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Model that produced `forecast`
    pub model_type: ModelType,
    pub report: AccuracyReport,
}

/// Runs the split backtest and the full refit through a model chain
#[derive(Debug)]
pub struct BacktestEvaluator {
    chain: ModelChain,
    train_ratio: f64,
    min_points: usize,
}

impl BacktestEvaluator {
    /// Create an evaluator around an explicit chain
    pub fn new(chain: ModelChain, train_ratio: f64, min_points: usize) -> Result<Self> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got {}",
                train_ratio
            )));
        }

        Ok(Self {
            chain,
            train_ratio,
            min_points,
        })
    }

    /// Evaluator with the standard chain and the configured split
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        Self::new(
            ModelChain::standard(config)?,
            config.train_ratio,
            config.min_backtest_points,
        )
    }

    /// Index of the first held-out point for a series of `n` values
    pub fn split_index(&self, n: usize) -> usize {
        let split = (self.train_ratio * n as f64).floor() as usize;
        split.clamp(1, n.saturating_sub(1).max(1))
    }

    /// Backtest a lineup's actuals and forecast `horizon` months past them
    pub fn evaluate(
        &self,
        lineup: &str,
        series: &[(NaiveDate, f64)],
        horizon: usize,
    ) -> Result<BacktestOutcome> {
        let mut ordered = series.to_vec();
        ordered.sort_by_key(|(date, _)| *date);
        let values: Vec<f64> = ordered.into_iter().map(|(_, v)| v).collect();

        if values.is_empty() {
            return Err(ForecastError::NoDataForEntity(lineup.to_string()));
        }

        if values.len() < self.min_points {
            return self.degenerate(lineup, &values, horizon);
        }

        let split = self.split_index(values.len());
        let (train, test) = values.split_at(split);

        let holdout = self.chain.forecast_values(train, test.len());
        let full = self.chain.forecast_values(&values, horizon)?;

        let report = match &holdout {
            Ok(fit) => {
                let accuracy = metrics::holdout_accuracy(test, &fit.values)?;
                AccuracyReport::measured(lineup, fit.model_type, accuracy, test.len())
            }
            Err(err) => {
                warn!(%lineup, error = %err, "training split could not be fitted");
                AccuracyReport::unmeasured(lineup, full.model_type)
            }
        };

        let training_residuals: &[f64] = match &holdout {
            Ok(ChainForecast {
                model_type: ModelType::Ets,
                residuals,
                ..
            }) => residuals.as_slice(),
            _ => &[],
        };
        let dispersion = Dispersion::for_model(full.model_type, training_residuals, &values);
        let (lower, upper) = confidence::bounds(&full.values, dispersion.half_width());

        debug!(
            %lineup,
            served = %full.model_type,
            backtested = %report.model_type,
            rmse = ?report.rmse,
            mape = report.mape,
            risk = %report.risk_level,
            "backtest complete"
        );

        Ok(BacktestOutcome {
            forecast: full.values,
            lower,
            upper,
            model_type: full.model_type,
            report,
        })
    }

    /// Too little history to split: serve the mean with a dispersion-based band.
    ///
    /// From the chain's model threshold on, the mean is clamped like any model output.
    fn degenerate(&self, lineup: &str, values: &[f64], horizon: usize) -> Result<BacktestOutcome> {
        let mut mean = statistics::mean(values)?;
        if values.len() >= self.chain.min_points() {
            mean = mean.max(0.0);
        }
        let forecast = vec![mean; horizon];
        let half_width = Dispersion::History(values).half_width();
        let (lower, upper) = confidence::bounds(&forecast, half_width);

        debug!(%lineup, points = values.len(), "history too short to backtest");

        Ok(BacktestOutcome {
            forecast,
            lower,
            upper,
            model_type: ModelType::SimpleMean,
            report: AccuracyReport::unmeasured(lineup, ModelType::SimpleMean),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{RiskLevel, PLACEHOLDER_MAPE};
    use approx::assert_abs_diff_eq;

    fn monthly(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1)
                    .unwrap();
                (date, *v)
            })
            .collect()
    }

    fn evaluator() -> BacktestEvaluator {
        BacktestEvaluator::from_config(&ForecastConfig::default()).unwrap()
    }

    #[test]
    fn test_split_index() {
        let e = evaluator();
        assert_eq!(e.split_index(10), 8);
        assert_eq!(e.split_index(6), 4);
        assert_eq!(e.split_index(24), 19);
    }

    #[test]
    fn test_single_point_degenerate_path() {
        let outcome = evaluator().evaluate("L1", &monthly(&[50.0]), 12).unwrap();

        assert_eq!(outcome.forecast, vec![50.0; 12]);
        assert_eq!(outcome.model_type, ModelType::SimpleMean);
        assert_eq!(outcome.report.model_type, ModelType::SimpleMean);
        assert_eq!(outcome.report.risk_level, RiskLevel::High);
        assert_eq!(outcome.report.mape, PLACEHOLDER_MAPE);
        assert!(!outcome.report.is_measured);
        // 0.1 * mean, times 1.96
        assert_abs_diff_eq!(outcome.upper[0], 50.0 + 9.8, epsilon = 1e-9);
        assert_abs_diff_eq!(outcome.lower[0], 50.0 - 9.8, epsilon = 1e-9);
    }

    #[test]
    fn test_short_series_serves_mean() {
        let outcome = evaluator()
            .evaluate("L1", &monthly(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3)
            .unwrap();

        assert_eq!(outcome.forecast, vec![30.0; 3]);
        assert_eq!(outcome.model_type, ModelType::SimpleMean);
        let std = statistics::std_dev(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        assert_abs_diff_eq!(outcome.upper[0], 30.0 + 1.96 * std, epsilon = 1e-9);
        assert_eq!(outcome.lower[0], 0.0);
    }

    #[test]
    fn test_short_negative_series_is_clamped() {
        let outcome = evaluator()
            .evaluate("L1", &monthly(&[-10.0, -20.0, -30.0]), 3)
            .unwrap();

        assert_eq!(outcome.model_type, ModelType::SimpleMean);
        assert_eq!(outcome.forecast, vec![0.0; 3]);
        assert!(outcome.lower.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_below_model_threshold_keeps_raw_mean() {
        let outcome = evaluator()
            .evaluate("L1", &monthly(&[-10.0, -20.0]), 2)
            .unwrap();
        assert_eq!(outcome.forecast, vec![-15.0; 2]);
    }

    #[test]
    fn test_linear_series_is_low_risk() {
        let values: Vec<f64> = (0..24).map(|i| 100.0 + i as f64).collect();
        let outcome = evaluator().evaluate("L1", &monthly(&values), 12).unwrap();

        assert_eq!(outcome.model_type, ModelType::Ets);
        assert_eq!(outcome.report.model_type, ModelType::Ets);
        assert_eq!(outcome.report.test_point_count, 5);
        assert!(outcome.report.is_measured);
        assert_abs_diff_eq!(outcome.report.rmse.unwrap(), 0.0, epsilon = 1e-6);
        assert_eq!(outcome.report.risk_level, RiskLevel::Low);
        assert!(outcome.forecast.iter().all(|v| *v >= 123.0));
    }

    #[test]
    fn test_bounds_bracket_forecast() {
        let values = [
            120.0, 95.0, 130.0, 110.0, 90.0, 140.0, 105.0, 125.0, 100.0, 135.0, 115.0, 98.0,
        ];
        let outcome = evaluator().evaluate("L1", &monthly(&values), 12).unwrap();

        assert_eq!(outcome.forecast.len(), 12);
        for i in 0..12 {
            assert!(outcome.lower[i] <= outcome.forecast[i]);
            assert!(outcome.upper[i] >= outcome.forecast[i]);
            assert!(outcome.lower[i] >= 0.0);
        }
        assert_eq!(outcome.report.test_point_count, 3);
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let mut series = monthly(&(0..10).map(|i| 10.0 * (i + 1) as f64).collect::<Vec<_>>());
        series.reverse();
        let outcome = evaluator().evaluate("L1", &series, 2).unwrap();
        assert_abs_diff_eq!(outcome.forecast[0], 110.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_series() {
        assert!(matches!(
            evaluator().evaluate("ghost", &[], 12),
            Err(ForecastError::NoDataForEntity(l)) if l == "ghost"
        ));
    }

    #[test]
    fn test_invalid_ratio() {
        let chain = ModelChain::standard(&ForecastConfig::default()).unwrap();
        assert!(BacktestEvaluator::new(chain, 1.5, 6).is_err());
    }
}
