mod common;

use common::{fixed_weather, three_segment_sources};
use demand_forecast::{
    DataSources, DemandPipeline, ForecastConfig, SegmentKey, SkipReason, SummaryRow,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    }
}

fn write_sources(dir: &Path, sources: &DataSources) -> (PathBuf, PathBuf, PathBuf) {
    let sales_path = dir.join("sales_data.csv");
    let mut sales = fs::File::create(&sales_path).unwrap();
    writeln!(sales, "date,store_id,product,sales_quantity,season,temperature,is_rainy").unwrap();
    for s in sources.sales() {
        writeln!(
            sales,
            "{},{},{},{},{},{},{}",
            s.date,
            s.store_id,
            s.product,
            s.sales_quantity,
            s.season.as_deref().unwrap_or(""),
            s.temperature.unwrap_or_default(),
            flag(s.is_rainy)
        )
        .unwrap();
    }

    let weather_path = dir.join("weather_data.csv");
    let mut weather = fs::File::create(&weather_path).unwrap();
    writeln!(weather, "date,store_id,humidity").unwrap();
    for w in sources.weather() {
        writeln!(weather, "{},{},{}", w.date, w.store_id, w.humidity.unwrap_or_default()).unwrap();
    }

    let events_path = dir.join("events_data.csv");
    let mut events = fs::File::create(&events_path).unwrap();
    writeln!(events, "date,store_id,event_name,impact_multiplier").unwrap();
    for e in sources.events() {
        writeln!(events, "{},{},holiday,{}", e.date, e.store_id, e.impact_multiplier.unwrap_or(1.0)).unwrap();
    }

    (sales_path, weather_path, events_path)
}

fn small_forest_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{ "weather_seed": 9, "forest": { "n_estimators": 5, "max_depth": 6 } }"#,
    )
    .unwrap();
    path
}

#[test]
fn test_full_forecast_workflow() {
    let dir = TempDir::new().unwrap();
    let (sales, weather, events) = write_sources(dir.path(), &three_segment_sources());
    let config = ForecastConfig::from_json_file(small_forest_config(dir.path())).unwrap();
    assert_eq!(config.forest.n_estimators, 5);
    assert_eq!(config.windows, vec![7, 14, 30]);

    // 1. Load and build features
    let mut pipeline = DemandPipeline::from_csv(config, &sales, &weather, &events).unwrap();
    assert_eq!(pipeline.table().len(), 2 * 425 + 45);

    // 2. Train the configured random forest
    let report = pipeline.train().unwrap();
    assert_eq!(report.trained.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key, SegmentKey::new("store_002", "umbrellas"));
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::InsufficientData { train: 40, test: 5 }
    );

    // 3. Summary covers trained segments only, in key order
    let summary = pipeline.summary();
    let keys: Vec<(&str, &str)> = summary
        .iter()
        .map(|r| (r.store_id.as_str(), r.product.as_str()))
        .collect();
    assert_eq!(keys, vec![("store_001", "hot_coffee"), ("store_001", "ice_cream")]);
    assert!(summary.iter().all(|r| r.mape.is_finite() && r.rmse >= 0.0 && r.train_size == 365));

    // 4. Forecast trained and untrained segments
    let mut sampler = pipeline.weather_sampler();
    let points = pipeline
        .forecast("store_001", "ice_cream", 7, &mut sampler)
        .unwrap()
        .unwrap();
    assert_eq!(points.len(), 7);
    assert!(points.windows(2).all(|w| w[1].date.signed_duration_since(w[0].date).num_days() == 1));
    assert_eq!(
        pipeline.forecast("store_002", "umbrellas", 7, &mut sampler).unwrap(),
        None
    );

    // 5. Export the summary
    let summary_path = dir.path().join("model_performance_summary.csv");
    pipeline.write_summary_csv(&summary_path).unwrap();
    let mut reader = csv::Reader::from_path(&summary_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["store_id", "product", "mape", "rmse", "train_size"]
    );
    let exported: Vec<SummaryRow> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0].store_id, summary[0].store_id);
    assert_eq!(exported[1].train_size, summary[1].train_size);
}

#[test]
fn test_forest_training_is_reproducible() {
    let config = ForecastConfig {
        forest: demand_forecast::ForestConfig {
            n_estimators: 4,
            max_depth: Some(5),
            ..Default::default()
        },
        ..ForecastConfig::default()
    };
    let sources = three_segment_sources();

    let mut first = DemandPipeline::from_sources(config.clone(), &sources).unwrap();
    first.train().unwrap();
    let mut second = DemandPipeline::from_sources(config, &sources).unwrap();
    second.train().unwrap();

    assert_eq!(first.summary(), second.summary());
    assert_eq!(
        first.forecast("store_001", "hot_coffee", 5, &mut fixed_weather()).unwrap(),
        second.forecast("store_001", "hot_coffee", 5, &mut fixed_weather()).unwrap()
    );
}

#[test]
fn test_strict_thresholds_leave_registry_empty() {
    let strict = ForecastConfig {
        min_train_rows: 1000,
        ..ForecastConfig::default()
    };
    let mut strict_pipeline =
        DemandPipeline::from_sources(strict, &three_segment_sources()).unwrap();
    let report = strict_pipeline.train_with(common::ConstantRegressor(3.0));
    assert!(report.trained.is_empty());
    assert!(strict_pipeline.summary().is_empty());
    assert!(strict_pipeline.get_model("store_001", "ice_cream").is_none());
}
