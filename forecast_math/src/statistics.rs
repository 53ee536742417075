//! Descriptive statistics over plain value slices

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().mean())
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns `None` when it is undefined, i.e. for fewer than two values or
/// when the inputs are not finite.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let sd = values.iter().std_dev();
    sd.is_finite().then_some(sd)
}

/// Mean of the last `window` values (or of all of them if the series is shorter)
pub fn tail_mean(values: &[f64], window: usize) -> Result<f64> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be at least 1".to_string(),
        ));
    }

    let start = values.len().saturating_sub(window);
    mean(&values[start..])
}

/// Root mean squared error between actual and predicted values
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_paired(actual, predicted)?;

    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    Ok(mse.sqrt())
}

/// Mean absolute percentage error as a fraction (0.1 == 10%).
///
/// Points whose actual value is zero are skipped. Returns `None` when every
/// actual value is zero and the error is therefore undefined.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<Option<f64>> {
    check_paired(actual, predicted)?;

    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (a, p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });

    if count == 0 {
        return Ok(None);
    }

    Ok(Some(sum / count as f64))
}

fn check_paired(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(MathError::InvalidInput(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}
