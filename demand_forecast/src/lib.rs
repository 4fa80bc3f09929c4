//! # Demand Forecast
//!
//! Daily demand forecasting for every `(store, product)` pair in a retail
//! sales history, using weather and event signals.
//!
//! ## Features
//!
//! - CSV loading of sales, weather and event sources
//! - Feature engineering: calendar fields, per-segment sales lags and
//!   rolling means, encoded categorical columns
//! - One random forest per segment, evaluated on a held-out year
//! - Recursive multi-day forecasts with simulated weather
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::{DemandPipeline, ForecastConfig};
//!
//! let mut pipeline = DemandPipeline::from_csv(
//!     ForecastConfig::default(),
//!     "sales_data.csv",
//!     "weather_data.csv",
//!     "events_data.csv",
//! )?;
//!
//! let report = pipeline.train()?;
//! println!("trained {} segments", report.trained.len());
//!
//! let mut weather = pipeline.weather_sampler();
//! if let Some(points) = pipeline.forecast("store_001", "ice_cream", 7, &mut weather)? {
//!     for point in points {
//!         println!("{}: {}", point.date, point.predicted_demand);
//!     }
//! }
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod trainer;
pub mod weather;

// Re-export commonly used types
pub use crate::config::{FillStrategy, ForecastConfig, ForestConfig};
pub use crate::data::{DataLoader, DataSources, EventRecord, SalesRecord, WeatherRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureBuilder, FeatureColumn, FeatureRow, FeatureSchema, FeatureTable};
pub use crate::forecaster::{Confidence, ForecastPoint, Forecaster};
pub use crate::models::{DemandRegressor, RandomForestRegressor, TrainedRegressor};
pub use crate::pipeline::{forecasts_to_json, DemandPipeline};
pub use crate::registry::{PerformanceMetrics, SegmentKey, SegmentRegistry, SummaryRow};
pub use crate::trainer::{SkipReason, SkippedSegment, Trainer, TrainingReport};
pub use crate::weather::{FixedWeather, Season, SeasonalWeather, SimulatedWeather, WeatherSampler};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
