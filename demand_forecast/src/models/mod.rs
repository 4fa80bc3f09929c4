//! Regression models used as per-segment demand predictors

use crate::error::Result;
use std::fmt::Debug;

/// A fitted predictor bound to a fixed-length feature vector
pub trait TrainedRegressor: Debug + Send + Sync {
    /// Predict the target for one feature vector
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Predict the target for many feature vectors
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Length of the feature vectors the model was fit on
    fn n_features(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Regression model that can be fit on a feature matrix
pub trait DemandRegressor: Debug {
    /// Fit a fresh predictor on `x` (one vector per row) against targets `y`
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn TrainedRegressor>>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod decision_tree;
pub mod random_forest;

pub use decision_tree::RegressionTree;
pub use random_forest::{RandomForestRegressor, TrainedRandomForest};
