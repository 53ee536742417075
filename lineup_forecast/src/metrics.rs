//! Metrics for evaluating forecast performance

use crate::error::Result;
use crate::models::ModelType;
use forecast_math::statistics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// MAPE below this is low risk
pub const LOW_RISK_MAPE: f64 = 0.10;
/// MAPE below this (and not low) is medium risk
pub const MEDIUM_RISK_MAPE: f64 = 0.20;
/// MAPE reported when accuracy could not be measured
pub const PLACEHOLDER_MAPE: f64 = 0.1;

/// Coarse reliability bucket of a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a MAPE (as a fraction); thresholds are exclusive upper bounds
    pub fn from_mape(mape: f64) -> Self {
        if mape < LOW_RISK_MAPE {
            RiskLevel::Low
        } else if mape < MEDIUM_RISK_MAPE {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error of a forecast against held-out actuals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldoutAccuracy {
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error as a fraction; `None` when every actual is zero
    pub mape: Option<f64>,
}

/// Compare a forecast with the actual values it was meant to predict
pub fn holdout_accuracy(actual: &[f64], forecast: &[f64]) -> Result<HoldoutAccuracy> {
    Ok(HoldoutAccuracy {
        rmse: statistics::rmse(actual, forecast)?,
        mape: statistics::mape(actual, forecast)?,
    })
}

/// Backtest diagnostics of one lineup.
///
/// The figures describe the model fitted on the training split, which is not
/// the model whose forecast is served (that one is refitted on the whole
/// history). When `is_measured` is false the MAPE is the fixed placeholder
/// and carries no accuracy information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub lineup: String,
    /// Model fitted on the training split
    pub model_type: ModelType,
    /// `None` when there was no held-out window
    pub rmse: Option<f64>,
    pub mape: f64,
    pub is_measured: bool,
    pub test_point_count: usize,
    pub risk_level: RiskLevel,
}

impl AccuracyReport {
    /// Diagnostics for a series too short to backtest
    pub fn unmeasured(lineup: &str, model_type: ModelType) -> Self {
        Self {
            lineup: lineup.to_string(),
            model_type,
            rmse: None,
            mape: PLACEHOLDER_MAPE,
            is_measured: false,
            test_point_count: 0,
            risk_level: RiskLevel::High,
        }
    }

    /// Diagnostics from a held-out comparison
    pub fn measured(
        lineup: &str,
        model_type: ModelType,
        accuracy: HoldoutAccuracy,
        test_point_count: usize,
    ) -> Self {
        match accuracy.mape {
            Some(mape) => Self {
                lineup: lineup.to_string(),
                model_type,
                rmse: Some(accuracy.rmse),
                mape,
                is_measured: true,
                test_point_count,
                risk_level: RiskLevel::from_mape(mape),
            },
            None => Self {
                rmse: Some(accuracy.rmse),
                test_point_count,
                ..Self::unmeasured(lineup, model_type)
            },
        }
    }
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backtest for {} ({}):", self.lineup, self.model_type)?;
        match self.rmse {
            Some(rmse) => writeln!(f, "  RMSE:  {:.4}", rmse)?,
            None => writeln!(f, "  RMSE:  n/a")?,
        }
        if self.is_measured {
            writeln!(f, "  MAPE:  {:.2}%", self.mape * 100.0)?;
        } else {
            writeln!(f, "  MAPE:  {:.2}% (placeholder)", self.mape * 100.0)?;
        }
        writeln!(f, "  Test points: {}", self.test_point_count)?;
        writeln!(f, "  Risk:  {}", self.risk_level)?;
        Ok(())
    }
}
