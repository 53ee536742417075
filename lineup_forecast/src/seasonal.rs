//! Seasonal synthetic actuals: the historical mean of each calendar month

use crate::error::{ForecastError, Result};
use crate::utils;
use chrono::NaiveDate;
use forecast_math::statistics;
use serde::Serialize;

/// Historical monthly mean of one lineup for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticActual {
    pub lineup: String,
    /// Calendar month, 1 = January
    pub month: u32,
    pub value: f64,
}

/// Mean actual value per calendar month, January first.
///
/// Months without any observation take the mean of the whole series.
pub fn seasonal_actuals(series: &[(NaiveDate, f64)]) -> Result<[f64; 12]> {
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    if values.is_empty() {
        return Err(ForecastError::DataError(
            "Cannot build seasonal actuals from an empty series".to_string(),
        ));
    }
    let overall = statistics::mean(&values)?;

    let mut by_month: [Vec<f64>; 12] = Default::default();
    for (date, value) in series {
        by_month[utils::month_index(*date)].push(*value);
    }

    let mut result = [overall; 12];
    for (slot, month_values) in result.iter_mut().zip(&by_month) {
        if !month_values.is_empty() {
            *slot = statistics::mean(month_values)?;
        }
    }
    Ok(result)
}

/// Seasonal actuals of a lineup as labelled records
pub fn synthetic_actuals(lineup: &str, series: &[(NaiveDate, f64)]) -> Result<Vec<SyntheticActual>> {
    let means = seasonal_actuals(series)?;
    Ok(means
        .iter()
        .enumerate()
        .map(|(i, value)| SyntheticActual {
            lineup: lineup.to_string(),
            month: i as u32 + 1,
            value: *value,
        })
        .collect())
}
