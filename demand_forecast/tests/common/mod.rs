// Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate};
use demand_forecast::{
    DataSources, DemandRegressor, EventRecord, FixedWeather, Result, SalesRecord,
    SimulatedWeather, TrainedRegressor, WeatherRecord,
};
use std::sync::{Arc, Mutex};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn season_for(date: NaiveDate) -> &'static str {
    match date.month() {
        12 | 1 | 2 => "winter",
        3..=5 => "spring",
        6..=8 => "summer",
        _ => "fall",
    }
}

/// `days` consecutive daily rows starting at `start`, with quantity `qty(i)`
pub fn segment_sales(
    store_id: &str,
    product: &str,
    start: NaiveDate,
    days: usize,
    qty: impl Fn(usize) -> f64,
) -> Vec<SalesRecord> {
    (0..days)
        .map(|i| {
            let day = start + Duration::days(i as i64);
            let mut record = SalesRecord::new(day, store_id, product, qty(i));
            record.season = Some(season_for(day).to_string());
            record.temperature = Some(60.0 + (i % 20) as f64);
            record.is_rainy = Some(i % 5 == 0);
            record
        })
        .collect()
}

/// A full training year plus `test_days` days of the following year
pub fn two_year_segment(store_id: &str, product: &str, test_days: usize) -> Vec<SalesRecord> {
    segment_sales(store_id, product, date(2022, 1, 1), 365 + test_days, |i| {
        20.0 + (i % 7) as f64 * 3.0
    })
}

pub fn weather_for(sales: &[SalesRecord]) -> Vec<WeatherRecord> {
    sales
        .iter()
        .map(|s| WeatherRecord {
            date: s.date,
            store_id: s.store_id.clone(),
            humidity: Some(55.0 + (s.date.day() % 10) as f64),
        })
        .collect()
}

pub fn sources(sales: Vec<SalesRecord>) -> DataSources {
    let weather = weather_for(&sales);
    let events = vec![EventRecord {
        date: date(2022, 7, 4),
        store_id: "store_001".to_string(),
        impact_multiplier: Some(1.5),
    }];
    DataSources::new(sales, weather, events)
}

/// Three segments; `store_002/umbrellas` is too short to train
pub fn three_segment_sources() -> DataSources {
    let mut sales = two_year_segment("store_001", "ice_cream", 60);
    sales.extend(two_year_segment("store_001", "hot_coffee", 60));
    sales.extend(segment_sales(
        "store_002",
        "umbrellas",
        date(2022, 11, 22),
        45,
        |i| 5.0 + i as f64,
    ));
    sources(sales)
}

pub fn fixed_weather() -> FixedWeather {
    FixedWeather(SimulatedWeather {
        temperature: 70.0,
        is_rainy: false,
        humidity: 60.0,
    })
}

/// Regressor that predicts the training mean and records every vector it sees
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    pub fitted: Arc<Mutex<Vec<Vec<f64>>>>,
    pub predicted: Arc<Mutex<Vec<Vec<f64>>>>,
}

#[derive(Debug)]
pub struct MeanModel {
    mean: f64,
    n_features: usize,
    predicted: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl DemandRegressor for MeanRegressor {
    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<Box<dyn TrainedRegressor>> {
        self.fitted.lock().unwrap().extend(x.iter().cloned());
        Ok(Box::new(MeanModel {
            mean: y.iter().sum::<f64>() / y.len() as f64,
            n_features: x[0].len(),
            predicted: Arc::clone(&self.predicted),
        }))
    }

    fn name(&self) -> &str {
        "mean"
    }
}

impl TrainedRegressor for MeanModel {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        self.predicted.lock().unwrap().push(features.to_vec());
        Ok(self.mean)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "mean"
    }
}

/// Predicts a fixed value regardless of input
#[derive(Debug, Clone, Copy)]
pub struct ConstantRegressor(pub f64);

#[derive(Debug)]
pub struct ConstantModel {
    value: f64,
    n_features: usize,
}

impl DemandRegressor for ConstantRegressor {
    fn fit(&self, x: &[Vec<f64>], _y: &[f64]) -> Result<Box<dyn TrainedRegressor>> {
        Ok(Box::new(ConstantModel {
            value: self.0,
            n_features: x[0].len(),
        }))
    }

    fn name(&self) -> &str {
        "constant"
    }
}

impl TrainedRegressor for ConstantModel {
    fn predict(&self, _features: &[f64]) -> Result<f64> {
        Ok(self.value)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "constant"
    }
}
