//! Pipeline configuration

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How missing lag, rolling and weather values are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Fill forward, backward, then zero, within each (store, product) segment
    #[default]
    PerSegment,
    /// Fill forward, backward, then zero over the whole sorted table.
    ///
    /// Values can carry over from one segment into the start of the next.
    TableWide,
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of bootstrapped trees
    pub n_estimators: usize,
    /// Maximum tree depth, unbounded when `None`
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
    /// Seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Configuration for feature building, training and forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Lag and rolling window sizes, in rows
    pub windows: Vec<usize>,
    /// Minimum training rows for a segment to get a model
    pub min_train_rows: usize,
    /// Minimum test rows for a segment to get a model
    pub min_test_rows: usize,
    /// Calendar year used for fitting
    pub train_year: i32,
    /// Calendar year used for evaluation
    pub test_year: i32,
    /// Historical rows seeding the recursive forecast
    pub context_rows: usize,
    /// Missing value handling for derived columns
    pub fill_strategy: FillStrategy,
    /// Seed for simulated weather, random when `None`
    pub weather_seed: Option<u64>,
    /// Stop training after this many segments
    pub max_segments: Option<usize>,
    /// Stop training after this many seconds of wall-clock time
    pub max_training_secs: Option<u64>,
    /// Regressor hyperparameters
    pub forest: ForestConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            windows: vec![7, 14, 30],
            min_train_rows: 50,
            min_test_rows: 10,
            train_year: 2022,
            test_year: 2023,
            context_rows: 30,
            fill_strategy: FillStrategy::default(),
            weather_seed: None,
            max_segments: None,
            max_training_secs: None,
            forest: ForestConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a configuration from a JSON file; omitted keys take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a pipeline
    pub fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one lag/rolling window is required".to_string(),
            ));
        }

        if self.windows.iter().any(|&w| w == 0) {
            return Err(ForecastError::InvalidParameter(
                "Window sizes must be positive".to_string(),
            ));
        }

        if self.context_rows == 0 {
            return Err(ForecastError::InvalidParameter(
                "context_rows must be positive".to_string(),
            ));
        }

        if self.train_year == self.test_year {
            return Err(ForecastError::InvalidParameter(format!(
                "Train and test years must differ (both {})",
                self.train_year
            )));
        }

        if self.forest.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }

        if self.forest.min_samples_leaf == 0 || self.forest.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be >= 1 and min_samples_split >= 2".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_pipeline() {
        let config = ForecastConfig::default();
        assert_eq!(config.windows, vec![7, 14, 30]);
        assert_eq!(config.min_train_rows, 50);
        assert_eq!(config.min_test_rows, 10);
        assert_eq!((config.train_year, config.test_year), (2022, 2023));
        assert_eq!(config.context_rows, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ForecastConfig =
            serde_json::from_str(r#"{"fill_strategy": "table_wide", "forest": {"n_estimators": 5}}"#)
                .unwrap();
        assert_eq!(config.fill_strategy, FillStrategy::TableWide);
        assert_eq!(config.forest.n_estimators, 5);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.min_train_rows, 50);
    }

    #[test]
    fn test_validate_rejects_bad_windows() {
        let config = ForecastConfig {
            windows: vec![7, 0],
            ..ForecastConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
