//! Bagged regression-tree ensemble

use crate::config::ForestConfig;
use crate::error::{ForecastError, Result};
use crate::models::decision_tree::{RegressionTree, TreeParams};
use crate::models::{DemandRegressor, TrainedRegressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random forest regressor: bootstrap samples, one regression tree each, averaged
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    /// Name of the model
    name: String,
    /// Number of trees
    n_estimators: usize,
    /// Growth limits applied to every tree
    tree_params: TreeParams,
    /// Seed for bootstrap sampling
    seed: u64,
}

/// Trained random forest
#[derive(Debug, Clone)]
pub struct TrainedRandomForest {
    /// Name of the model
    name: String,
    /// Fitted trees
    trees: Vec<RegressionTree>,
    /// Feature vector length seen at fit time
    n_features: usize,
}

impl RandomForestRegressor {
    /// Create a new random forest with default tree limits
    pub fn new(n_estimators: usize, seed: u64) -> Result<Self> {
        Self::from_config(&ForestConfig {
            n_estimators,
            seed,
            ..ForestConfig::default()
        })
    }

    /// Create a random forest from configuration
    pub fn from_config(config: &ForestConfig) -> Result<Self> {
        if config.n_estimators == 0 {
            return Err(ForecastError::InvalidParameter(
                "Number of trees must be positive".to_string(),
            ));
        }

        if config.min_samples_leaf == 0 || config.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "Trees need min_samples_leaf >= 1 and min_samples_split >= 2".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Random Forest (trees={})", config.n_estimators),
            n_estimators: config.n_estimators,
            tree_params: TreeParams {
                max_depth: config.max_depth,
                min_samples_split: config.min_samples_split,
                min_samples_leaf: config.min_samples_leaf,
            },
            seed: config.seed,
        })
    }
}

fn validate_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(ForecastError::Training(
            "Cannot fit on an empty feature matrix".to_string(),
        ));
    }

    if x.len() != y.len() {
        return Err(ForecastError::Training(format!(
            "Feature rows ({}) don't match targets ({})",
            x.len(),
            y.len()
        )));
    }

    let n_features = x[0].len();
    if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
        return Err(ForecastError::Training(
            "Feature rows must share one non-zero length".to_string(),
        ));
    }

    if y.iter().any(|v| !v.is_finite()) || x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ForecastError::Training(
            "Training data contains non-finite values".to_string(),
        ));
    }

    Ok(n_features)
}

impl DemandRegressor for RandomForestRegressor {
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn TrainedRegressor>> {
        let n_features = validate_training_data(x, y)?;
        let n = x.len();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit(x, y, &sample, &self.tree_params)?);
        }

        Ok(Box::new(TrainedRandomForest {
            name: self.name.clone(),
            trees,
            n_features,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedRegressor for TrainedRandomForest {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(ForecastError::Validation(format!(
                "Expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let total: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        Ok(total / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = (0..60).map(|i| 2.0 * i as f64 + 10.0).collect();
        (x, y)
    }

    #[test]
    fn test_forest_fits_and_predicts_in_range() {
        let (x, y) = linear_data();
        let model = RandomForestRegressor::new(20, 42).unwrap();
        let trained = model.fit(&x, &y).unwrap();

        assert_eq!(trained.n_features(), 2);
        let prediction = trained.predict(&[30.0, 2.0]).unwrap();
        assert!(prediction > 50.0 && prediction < 90.0);
    }

    #[test]
    fn test_forest_is_deterministic_for_a_seed() {
        let (x, y) = linear_data();
        let model = RandomForestRegressor::new(10, 7).unwrap();
        let a = model.fit(&x, &y).unwrap().predict(&[12.5, 3.0]).unwrap();
        let b = model.fit(&x, &y).unwrap().predict(&[12.5, 3.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_forest_rejects_wrong_vector_length() {
        let (x, y) = linear_data();
        let trained = RandomForestRegressor::new(3, 1).unwrap().fit(&x, &y).unwrap();
        assert!(matches!(
            trained.predict(&[1.0]),
            Err(ForecastError::Validation(_))
        ));
    }

    #[test]
    fn test_forest_rejects_bad_training_data() {
        let model = RandomForestRegressor::new(3, 1).unwrap();
        assert!(model.fit(&[], &[]).is_err());
        assert!(model.fit(&[vec![1.0], vec![2.0]], &[1.0]).is_err());
        assert!(model.fit(&[vec![1.0], vec![f64::NAN]], &[1.0, 2.0]).is_err());
        assert!(RandomForestRegressor::new(0, 1).is_err());
    }
}
