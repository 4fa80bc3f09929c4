//! Accuracy metrics for regression forecasts

use crate::{MathError, Result};

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot score an empty set of observations".to_string(),
        ));
    }

    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }

    Ok(())
}

fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MathError::CalculationError(format!("{} is not finite", name)))
    }
}

/// Mean absolute percentage error, expressed in percent.
///
/// Zero actuals are guarded with `f64::EPSILON` in the denominator rather than
/// skipped, so a miss on a zero-demand day shows up as a very large error.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p).abs() / a.abs().max(f64::EPSILON))
        .sum();

    finite("MAPE", total / actual.len() as f64 * 100.0)
}

/// Root mean squared error, in the units of the observations.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    finite("RMSE", mse.sqrt())
}
