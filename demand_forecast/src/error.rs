//! Error types for the demand_forecast crate

use demand_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A required input source is missing, unreadable, or lacks a required column
    #[error("Data source error: {0}")]
    DataSource(String),

    /// The feature schema is invalid or asks for data the sources don't provide
    #[error("Schema error: {0}")]
    Schema(String),

    /// A segment has too few rows on one side of the temporal split
    #[error("Insufficient data: train={train}, test={test}")]
    InsufficientData {
        /// Rows available for fitting
        train: usize,
        /// Rows available for evaluation
        test: usize,
    },

    /// Fitting or evaluating a per-segment model failed
    #[error("Training error: {0}")]
    Training(String),

    /// The predictor failed while rolling a forecast forward
    #[error("Forecasting error: {0}")]
    Forecasting(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from window or metric calculations
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    Json(String),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::Polars(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Json(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}
