//! End-to-end pipeline: load, build features, train, forecast, report

use crate::config::ForecastConfig;
use crate::data::{DataLoader, DataSources};
use crate::error::Result;
use crate::features::{FeatureBuilder, FeatureSchema, FeatureTable};
use crate::forecaster::{ForecastPoint, Forecaster};
use crate::models::{DemandRegressor, RandomForestRegressor, TrainedRegressor};
use crate::registry::{PerformanceMetrics, SegmentRegistry, SummaryRow};
use crate::trainer::{Trainer, TrainingReport};
use crate::weather::{SeasonalWeather, WeatherSampler};
use rand::rngs::StdRng;
use std::path::Path;
use tracing::info;

/// Owns everything needed to train segment models and forecast from them
#[derive(Debug)]
pub struct DemandPipeline {
    config: ForecastConfig,
    schema: FeatureSchema,
    table: FeatureTable,
    registry: SegmentRegistry,
}

impl DemandPipeline {
    /// Load the three CSV sources and build the feature table with the standard schema
    pub fn from_csv<P: AsRef<Path>>(
        config: ForecastConfig,
        sales: P,
        weather: P,
        events: P,
    ) -> Result<Self> {
        let sources = DataLoader::from_csv(sales, weather, events)?;
        Self::from_sources(config, &sources)
    }

    /// Build the feature table from already loaded sources with the standard schema
    pub fn from_sources(config: ForecastConfig, sources: &DataSources) -> Result<Self> {
        let schema = FeatureSchema::standard(&config.windows)?;
        Self::with_schema(config, schema, sources)
    }

    /// Build the feature table for a custom schema
    pub fn with_schema(
        config: ForecastConfig,
        schema: FeatureSchema,
        sources: &DataSources,
    ) -> Result<Self> {
        let builder = FeatureBuilder::new(schema, &config)?;
        let table = builder.build(sources)?;

        Ok(Self {
            config,
            schema: builder.schema().clone(),
            table,
            registry: SegmentRegistry::new(),
        })
    }

    /// Train every segment with the configured random forest
    pub fn train(&mut self) -> Result<TrainingReport> {
        let forest = RandomForestRegressor::from_config(&self.config.forest)?;
        Ok(self.train_with(forest))
    }

    /// Train every segment with `regressor`, replacing any earlier models
    pub fn train_with<R: DemandRegressor>(&mut self, regressor: R) -> TrainingReport {
        let trainer = Trainer::new(regressor, &self.config);
        let mut registry = SegmentRegistry::new();
        let report = trainer.train_all(&self.table, &self.schema, &mut registry);
        self.registry = registry;
        report
    }

    /// Forecast one segment; `Ok(None)` when it has no model or history
    pub fn forecast<W: WeatherSampler + ?Sized>(
        &self,
        store_id: &str,
        product: &str,
        days: usize,
        weather: &mut W,
    ) -> Result<Option<Vec<ForecastPoint>>> {
        Forecaster::new(
            &self.registry,
            &self.table,
            &self.schema,
            self.config.context_rows,
        )
        .forecast(store_id, product, days, weather)
    }

    /// Weather sampler seeded from the config, or from entropy when unseeded
    pub fn weather_sampler(&self) -> SeasonalWeather<StdRng> {
        match self.config.weather_seed {
            Some(seed) => SeasonalWeather::seeded(seed),
            None => SeasonalWeather::from_entropy(),
        }
    }

    pub fn get_model(&self, store_id: &str, product: &str) -> Option<&dyn TrainedRegressor> {
        self.registry.get_model(store_id, product)
    }

    pub fn get_metrics(&self, store_id: &str, product: &str) -> Option<&PerformanceMetrics> {
        self.registry.get_metrics(store_id, product)
    }

    /// One row per trained segment, ordered by `(store_id, product)`
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.registry.summary()
    }

    /// Write the performance summary as CSV with a header row
    pub fn write_summary_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let summary = self.summary();
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for row in &summary {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(path = %path.as_ref().display(), rows = summary.len(), "wrote performance summary");
        Ok(())
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }
}

/// Serialize forecast points as a pretty-printed JSON array
pub fn forecasts_to_json(points: &[ForecastPoint]) -> Result<String> {
    Ok(serde_json::to_string_pretty(points)?)
}
