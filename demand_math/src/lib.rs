//! # Demand Math
//!
//! Numeric building blocks for the demand forecasting pipeline.
//! This crate provides the lag/rolling window calculations used for
//! feature engineering, gap filling for missing window values, and the
//! accuracy metrics used to evaluate per-segment models.

use thiserror::Error;

pub mod fill;
pub mod metrics;
pub mod windows;

pub use fill::{backward_fill, fill_missing, forward_fill};
pub use metrics::{mean_absolute_percentage_error, root_mean_squared_error};
pub use windows::{lag, lookback, rolling_mean, trailing_mean};

/// Errors that can occur in demand calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for demand math operations
pub type Result<T> = std::result::Result<T, MathError>;
