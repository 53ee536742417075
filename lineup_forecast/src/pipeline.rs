//! Forecast generation for a single lineup

use crate::backtest::BacktestEvaluator;
use crate::data::{MeasureKind, TimeSeriesStore};
use crate::error::{ForecastError, Result};
use crate::metrics::{AccuracyReport, RiskLevel};
use crate::models::ModelType;
use crate::seasonal::{self, SyntheticActual};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One forecast month of one lineup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub lineup: String,
    pub date: NaiveDate,
    pub forecast_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub model_type: ModelType,
    pub risk_level: RiskLevel,
}

/// Everything generated for one lineup in a run
#[derive(Debug, Clone, PartialEq)]
pub struct LineupForecast {
    pub points: Vec<ForecastPoint>,
    pub report: AccuracyReport,
    pub synthetic: Vec<SyntheticActual>,
}

/// Forecast one lineup from its actuals over the given forecast months
pub fn forecast_lineup(
    store: &TimeSeriesStore,
    evaluator: &BacktestEvaluator,
    lineup: &str,
    months: &[NaiveDate],
) -> Result<LineupForecast> {
    let series = store.series(lineup, MeasureKind::Actual);
    if series.is_empty() {
        return Err(ForecastError::NoDataForEntity(lineup.to_string()));
    }

    let outcome = evaluator.evaluate(lineup, &series, months.len())?;
    let synthetic = seasonal::synthetic_actuals(lineup, &series)?;

    let points = months
        .iter()
        .enumerate()
        .map(|(i, date)| ForecastPoint {
            lineup: lineup.to_string(),
            date: *date,
            forecast_value: outcome.forecast[i],
            lower_bound: outcome.lower[i],
            upper_bound: outcome.upper[i],
            model_type: outcome.model_type,
            risk_level: outcome.report.risk_level,
        })
        .collect();

    Ok(LineupForecast {
        points,
        report: outcome.report,
        synthetic,
    })
}

/// Forecast year for a store: the configured year, or the year after its latest observation
pub fn resolve_forecast_year(store: &TimeSeriesStore, configured: Option<i32>) -> Result<i32> {
    match configured {
        Some(year) => Ok(year),
        None => store
            .latest_date()
            .map(|date| date.year() + 1)
            .ok_or_else(|| ForecastError::DataError("No historical data loaded".to_string())),
    }
}

/// Reject forecast months that do not lie strictly after the latest observation
pub fn ensure_future_months(store: &TimeSeriesStore, months: &[NaiveDate]) -> Result<()> {
    match (months.first(), store.latest_date()) {
        (Some(first), Some(latest)) if *first <= latest => {
            Err(ForecastError::InvalidParameter(format!(
                "Forecast starts at {} but history runs to {}",
                first.format("%Y-%m"),
                latest.format("%Y-%m")
            )))
        }
        _ => Ok(()),
    }
}
