//! Recursive multi-day demand forecasting
//!
//! A forecast starts from the most recent historical rows of a segment and
//! walks forward one day at a time. Each synthesized day gets calendar fields
//! from its date, simulated weather, a neutral event impact, and lag/rolling
//! values read from the context window of history plus the predictions made
//! so far. The prediction is appended to that window before the next day is
//! built, so forecast errors compound over the horizon.

use crate::error::{ForecastError, Result};
use crate::features::{flag, CalendarFeatures, FeatureRow, FeatureSchema, FeatureTable};
use crate::registry::{SegmentKey, SegmentRegistry};
use crate::weather::{Season, SimulatedWeather, WeatherSampler};
use chrono::{Duration, NaiveDate};
use demand_math::{lookback, trailing_mean};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Qualitative confidence attached to a forecast point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Predicted demand for one future day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_demand: u64,
    pub confidence: Confidence,
}

/// Reads trained models and history; never modifies either
#[derive(Debug, Clone, Copy)]
pub struct Forecaster<'a> {
    registry: &'a SegmentRegistry,
    table: &'a FeatureTable,
    schema: &'a FeatureSchema,
    context_rows: usize,
}

impl<'a> Forecaster<'a> {
    pub fn new(
        registry: &'a SegmentRegistry,
        table: &'a FeatureTable,
        schema: &'a FeatureSchema,
        context_rows: usize,
    ) -> Self {
        Self {
            registry,
            table,
            schema,
            context_rows,
        }
    }

    /// Forecast `horizon_days` days after the segment's last historical date.
    ///
    /// Returns `Ok(None)` when the segment has no model or no history.
    pub fn forecast<W: WeatherSampler + ?Sized>(
        &self,
        store_id: &str,
        product: &str,
        horizon_days: usize,
        weather: &mut W,
    ) -> Result<Option<Vec<ForecastPoint>>> {
        let key = SegmentKey::new(store_id, product);

        let Some(model) = self.registry.get_model(store_id, product) else {
            warn!(store_id, product, "no model found for segment");
            return Ok(None);
        };

        let history = self.table.segment_tail(&key, self.context_rows);
        let Some(latest) = history.last() else {
            warn!(store_id, product, "no historical data found for segment");
            return Ok(None);
        };

        let season = Season::parse(latest.season.as_deref());
        let mut context: Vec<f64> = history.iter().map(|r| r.sales_quantity).collect();
        let mut points = Vec::with_capacity(horizon_days);

        for offset in 1..=horizon_days {
            let date = latest
                .date
                .checked_add_signed(Duration::days(offset as i64))
                .ok_or_else(|| {
                    ForecastError::Forecasting(format!(
                        "Date overflow {} days after {}",
                        offset, latest.date
                    ))
                })?;

            let row = synthesize_row(latest, date, &context, weather.sample(season));
            let features = self.schema.vector(&row);
            let prediction = model.predict(&features).map_err(|e| {
                ForecastError::Forecasting(format!("{} on {}: {}", key, date, e))
            })?;

            let predicted_demand = prediction.trunc().max(0.0) as u64;
            context.push(predicted_demand as f64);
            points.push(ForecastPoint {
                date,
                predicted_demand,
                confidence: Confidence::Medium,
            });
        }

        debug!(store_id, product, days = points.len(), "forecast complete");
        Ok(Some(points))
    }
}

/// Build the feature row for a future date.
///
/// Categorical codes and window sizes come from the latest historical row;
/// lags and rolling means come from `context`, which ends with the day before `date`.
fn synthesize_row(
    latest: &FeatureRow,
    date: NaiveDate,
    context: &[f64],
    weather: SimulatedWeather,
) -> FeatureRow {
    let calendar = CalendarFeatures::from_date(date);

    FeatureRow {
        date,
        store_id: latest.store_id.clone(),
        product: latest.product.clone(),
        season: latest.season.clone(),
        sales_quantity: 0.0,
        temperature: weather.temperature,
        is_rainy: flag(weather.is_rainy),
        humidity: weather.humidity,
        is_weekend: flag(calendar.is_weekend()),
        event_impact: 1.0,
        calendar,
        lags: latest
            .lags
            .keys()
            .map(|&w| (w, lookback(context, w).unwrap_or(0.0)))
            .collect(),
        rolling: latest
            .rolling
            .keys()
            .map(|&w| (w, trailing_mean(context, w).unwrap_or(0.0)))
            .collect(),
        product_code: latest.product_code,
        season_code: latest.season_code,
        store_code: latest.store_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_labels_are_lowercase() {
        for (confidence, label) in [
            (Confidence::Low, "low"),
            (Confidence::Medium, "medium"),
            (Confidence::High, "high"),
        ] {
            assert_eq!(confidence.to_string(), label);
            let json = serde_json::to_string(&confidence).unwrap();
            assert_eq!(json, format!("\"{}\"", label));
            assert_eq!(serde_json::from_str::<Confidence>(&json).unwrap(), confidence);
        }
    }
}
