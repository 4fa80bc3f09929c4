//! Per-segment training and evaluation
//!
//! Rows are split by calendar year into a training year and a test year.
//! Every segment is fit and scored independently: a segment that is too
//! small or whose model fails is recorded as skipped and the loop moves on.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, FeatureSchema, FeatureTable};
use crate::models::{DemandRegressor, TrainedRegressor};
use crate::registry::{PerformanceMetrics, SegmentKey, SegmentRegistry};
use demand_math::{mean_absolute_percentage_error, root_mean_squared_error};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why a segment ended up without a model
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Too few rows in the training or test year
    InsufficientData { train: usize, test: usize },
    /// The regressor failed to fit or predict
    TrainingFailed(String),
}

/// A segment that was not trained
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSegment {
    pub key: SegmentKey,
    pub reason: SkipReason,
}

/// Outcome of a training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// Segments that now have a model, in training order
    pub trained: Vec<SegmentKey>,
    /// Segments that were attempted but have no model
    pub skipped: Vec<SkippedSegment>,
    /// True when the segment or time budget stopped the loop early
    pub budget_exhausted: bool,
}

/// Fits one model per segment with a shared regressor configuration
#[derive(Debug)]
pub struct Trainer<R: DemandRegressor> {
    regressor: R,
    train_year: i32,
    test_year: i32,
    min_train_rows: usize,
    min_test_rows: usize,
    max_segments: Option<usize>,
    time_budget: Option<Duration>,
}

impl<R: DemandRegressor> Trainer<R> {
    /// Create a trainer using the split, thresholds and budget from `config`
    pub fn new(regressor: R, config: &ForecastConfig) -> Self {
        Self {
            regressor,
            train_year: config.train_year,
            test_year: config.test_year,
            min_train_rows: config.min_train_rows,
            min_test_rows: config.min_test_rows,
            max_segments: config.max_segments,
            time_budget: config.max_training_secs.map(Duration::from_secs),
        }
    }

    /// Train every segment in the table, storing successes in `registry`
    pub fn train_all(
        &self,
        table: &FeatureTable,
        schema: &FeatureSchema,
        registry: &mut SegmentRegistry,
    ) -> TrainingReport {
        let started = Instant::now();
        let mut report = TrainingReport::default();

        info!(
            model = self.regressor.name(),
            train_year = self.train_year,
            test_year = self.test_year,
            "training segment models"
        );

        for (attempted, key) in table.segment_keys().enumerate() {
            if self.max_segments.map_or(false, |max| attempted >= max) {
                warn!(max_segments = attempted, "segment budget reached, stopping training");
                report.budget_exhausted = true;
                break;
            }

            if let Some(budget) = self.time_budget {
                if started.elapsed() >= budget {
                    warn!(elapsed_secs = started.elapsed().as_secs(), "time budget reached, stopping training");
                    report.budget_exhausted = true;
                    break;
                }
            }

            match self.train_segment(table.segment(key), schema) {
                Ok((model, metrics)) => {
                    info!(
                        store_id = %key.store_id,
                        product = %key.product,
                        mape = metrics.mape,
                        rmse = metrics.rmse,
                        "trained segment"
                    );
                    registry.insert(key.clone(), model, metrics);
                    report.trained.push(key.clone());
                }
                Err(ForecastError::InsufficientData { train, test }) => {
                    info!(
                        store_id = %key.store_id,
                        product = %key.product,
                        train,
                        test,
                        "skipping segment: insufficient data"
                    );
                    report.skipped.push(SkippedSegment {
                        key: key.clone(),
                        reason: SkipReason::InsufficientData { train, test },
                    });
                }
                Err(err) => {
                    warn!(
                        store_id = %key.store_id,
                        product = %key.product,
                        error = %err,
                        "error training segment"
                    );
                    report.skipped.push(SkippedSegment {
                        key: key.clone(),
                        reason: SkipReason::TrainingFailed(err.to_string()),
                    });
                }
            }
        }

        info!(
            trained = report.trained.len(),
            skipped = report.skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training finished"
        );

        report
    }

    /// Fit and evaluate one segment's rows
    pub fn train_segment(
        &self,
        rows: &[FeatureRow],
        schema: &FeatureSchema,
    ) -> Result<(Box<dyn TrainedRegressor>, PerformanceMetrics)> {
        let train: Vec<&FeatureRow> = rows
            .iter()
            .filter(|r| r.calendar.year == self.train_year)
            .collect();
        let test: Vec<&FeatureRow> = rows
            .iter()
            .filter(|r| r.calendar.year == self.test_year)
            .collect();

        if train.len() < self.min_train_rows || test.len() < self.min_test_rows {
            return Err(ForecastError::InsufficientData {
                train: train.len(),
                test: test.len(),
            });
        }

        let x_train: Vec<Vec<f64>> = train.iter().map(|r| schema.vector(r)).collect();
        let y_train: Vec<f64> = train.iter().map(|r| r.sales_quantity).collect();
        let x_test: Vec<Vec<f64>> = test.iter().map(|r| schema.vector(r)).collect();
        let y_test: Vec<f64> = test.iter().map(|r| r.sales_quantity).collect();

        let model = self.regressor.fit(&x_train, &y_train)?;
        if model.n_features() != schema.len() {
            return Err(ForecastError::Training(format!(
                "Model expects {} features but the schema has {}",
                model.n_features(),
                schema.len()
            )));
        }

        let y_pred = model.predict_batch(&x_test)?;
        let metrics = PerformanceMetrics {
            mape: mean_absolute_percentage_error(&y_test, &y_pred)?,
            rmse: root_mean_squared_error(&y_test, &y_pred)?,
            train_size: train.len(),
            test_size: test.len(),
        };
        debug!(train = train.len(), test = test.len(), "segment evaluated");

        Ok((model, metrics))
    }
}
