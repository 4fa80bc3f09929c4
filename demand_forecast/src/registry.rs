//! Per-segment model registry
//!
//! A segment is one `(store_id, product)` pair. Each trained segment owns
//! exactly one predictor and the metrics computed when it was evaluated;
//! segments that were skipped have neither.

use crate::models::TrainedRegressor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey {
    pub store_id: String,
    pub product: String,
}

impl SegmentKey {
    pub fn new(store_id: &str, product: &str) -> Self {
        Self {
            store_id: store_id.to_string(),
            product: product.to_string(),
        }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.store_id, self.product)
    }
}

/// Evaluation results recorded when a segment model is trained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean absolute percentage error, in percent
    pub mape: f64,
    /// Root mean squared error, in units sold
    pub rmse: f64,
    /// Rows used for fitting
    pub train_size: usize,
    /// Rows used for evaluation
    pub test_size: usize,
}

/// One line of the performance summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub store_id: String,
    pub product: String,
    pub mape: f64,
    pub rmse: f64,
    pub train_size: usize,
}

#[derive(Debug)]
struct SegmentModel {
    model: Box<dyn TrainedRegressor>,
    metrics: PerformanceMetrics,
}

/// Trained models and their metrics, keyed by segment
#[derive(Debug, Default)]
pub struct SegmentRegistry {
    segments: BTreeMap<SegmentKey, SegmentModel>,
}

impl SegmentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a trained model, replacing any earlier model for the segment
    pub fn insert(
        &mut self,
        key: SegmentKey,
        model: Box<dyn TrainedRegressor>,
        metrics: PerformanceMetrics,
    ) {
        self.segments.insert(key, SegmentModel { model, metrics });
    }

    /// Trained model for a segment, if one exists
    pub fn get_model(&self, store_id: &str, product: &str) -> Option<&dyn TrainedRegressor> {
        self.segments
            .get(&SegmentKey::new(store_id, product))
            .map(|s| &*s.model)
    }

    /// Evaluation metrics for a segment, if it was trained
    pub fn get_metrics(&self, store_id: &str, product: &str) -> Option<&PerformanceMetrics> {
        self.segments
            .get(&SegmentKey::new(store_id, product))
            .map(|s| &s.metrics)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Performance of every trained segment, ordered by `(store_id, product)`
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.segments
            .iter()
            .map(|(key, segment)| SummaryRow {
                store_id: key.store_id.clone(),
                product: key.product.clone(),
                mape: segment.metrics.mape,
                rmse: segment.metrics.rmse,
                train_size: segment.metrics.train_size,
            })
            .collect()
    }
}
