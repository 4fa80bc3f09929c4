//! Lag and trailing-window calculations
//!
//! All functions here operate on a single, already time-ordered series.
//! Grouping rows into segments is the caller's job; nothing in this module
//! ever looks across the slice it was handed.

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Shift a series by `window` positions.
///
/// Position `i` of the result holds `values[i - window]`, and is `None` for
/// the first `window` positions.
pub fn lag(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Lag window must be greater than zero".to_string(),
        ));
    }

    Ok((0..values.len())
        .map(|i| i.checked_sub(window).map(|j| values[j]))
        .collect())
}

/// Trailing mean over exactly `window` observations, inclusive of the current one.
///
/// The first `window - 1` positions are `None`. Each mean is taken from its
/// own slice, so one extreme value never skews later windows.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Rolling window must be greater than zero".to_string(),
        ));
    }

    Ok((0..values.len())
        .map(|i| {
            (i + 1)
                .checked_sub(window)
                .map(|start| values[start..=i].iter().mean())
        })
        .collect())
}

/// Value `window` positions before the end of `values`, i.e. the lag for the
/// observation that would be appended next.
///
/// Falls back to the most recent value when the series is shorter than
/// `window`. Returns `None` only for an empty series.
pub fn lookback(values: &[f64], window: usize) -> Option<f64> {
    if values.len() >= window && window > 0 {
        values.get(values.len() - window).copied()
    } else {
        values.last().copied()
    }
}

/// Mean of the last `min(window, len)` observations.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if values.is_empty() || window == 0 {
        return None;
    }

    let start = values.len().saturating_sub(window);
    Some(values[start..].iter().mean())
}
