//! Sales, weather and event sources for demand forecasting

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One day of sales for a single store and product
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// Sales day
    pub date: NaiveDate,
    /// Store identifier
    pub store_id: String,
    /// Product name
    pub product: String,
    /// Units sold
    pub sales_quantity: f64,
    /// Demand multiplier from events, when the sales feed carries it
    pub event_impact: Option<f64>,
    /// Season label (winter, spring, summer, fall)
    pub season: Option<String>,
    /// Observed temperature
    pub temperature: Option<f64>,
    /// Whether it rained
    pub is_rainy: Option<bool>,
    /// Whether the day fell on a weekend
    pub is_weekend: Option<bool>,
}

impl SalesRecord {
    /// Create a record with only the mandatory fields populated
    pub fn new(date: NaiveDate, store_id: &str, product: &str, sales_quantity: f64) -> Self {
        Self {
            date,
            store_id: store_id.to_string(),
            product: product.to_string(),
            sales_quantity,
            event_impact: None,
            season: None,
            temperature: None,
            is_rainy: None,
            is_weekend: None,
        }
    }
}

/// Daily weather observation for a store
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    /// Observation day
    pub date: NaiveDate,
    /// Store identifier
    pub store_id: String,
    /// Relative humidity
    pub humidity: Option<f64>,
}

/// Event affecting a store on a given day
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event day
    pub date: NaiveDate,
    /// Store identifier
    pub store_id: String,
    /// Demand multiplier caused by the event
    pub impact_multiplier: Option<f64>,
}

/// Optional sales columns that feature columns may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SalesColumn {
    EventImpact,
    Season,
    Temperature,
    IsRainy,
    IsWeekend,
}

impl SalesColumn {
    /// Column name in the sales source
    pub fn name(&self) -> &'static str {
        match self {
            SalesColumn::EventImpact => "event_impact",
            SalesColumn::Season => "season",
            SalesColumn::Temperature => "temperature",
            SalesColumn::IsRainy => "is_rainy",
            SalesColumn::IsWeekend => "is_weekend",
        }
    }

    fn is_present(&self, record: &SalesRecord) -> bool {
        match self {
            SalesColumn::EventImpact => record.event_impact.is_some(),
            SalesColumn::Season => record.season.is_some(),
            SalesColumn::Temperature => record.temperature.is_some(),
            SalesColumn::IsRainy => record.is_rainy.is_some(),
            SalesColumn::IsWeekend => record.is_weekend.is_some(),
        }
    }
}

const OPTIONAL_SALES_COLUMNS: [SalesColumn; 5] = [
    SalesColumn::EventImpact,
    SalesColumn::Season,
    SalesColumn::Temperature,
    SalesColumn::IsRainy,
    SalesColumn::IsWeekend,
];

/// The three loaded sources, read-only once built
#[derive(Debug, Clone)]
pub struct DataSources {
    sales: Vec<SalesRecord>,
    weather: Vec<WeatherRecord>,
    events: Vec<EventRecord>,
    sales_columns: BTreeSet<SalesColumn>,
}

impl DataSources {
    /// Bundle typed records; an optional sales column counts as provided if any row carries it
    pub fn new(
        sales: Vec<SalesRecord>,
        weather: Vec<WeatherRecord>,
        events: Vec<EventRecord>,
    ) -> Self {
        let sales_columns = OPTIONAL_SALES_COLUMNS
            .iter()
            .copied()
            .filter(|column| sales.iter().any(|record| column.is_present(record)))
            .collect();

        Self {
            sales,
            weather,
            events,
            sales_columns,
        }
    }

    /// Sales rows, in source order
    pub fn sales(&self) -> &[SalesRecord] {
        &self.sales
    }

    /// Weather rows, in source order
    pub fn weather(&self) -> &[WeatherRecord] {
        &self.weather
    }

    /// Event rows, in source order
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Whether the sales source provides an optional column
    pub fn has_sales_column(&self, column: SalesColumn) -> bool {
        self.sales_columns.contains(&column)
    }
}

/// Data loader for the sales, weather and event sources
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load all three sources from CSV files
    pub fn from_csv<P: AsRef<Path>>(sales: P, weather: P, events: P) -> Result<DataSources> {
        let sales = Self::load_sales(sales)?;
        let weather = Self::load_weather(weather)?;
        let events = Self::load_events(events)?;

        info!(
            sales = sales.len(),
            weather = weather.len(),
            events = events.len(),
            "loaded data sources"
        );

        Ok(DataSources::new(sales, weather, events))
    }

    /// Load the sales history from a CSV file
    pub fn load_sales<P: AsRef<Path>>(path: P) -> Result<Vec<SalesRecord>> {
        Self::sales_from_dataframe(&Self::read_csv(path.as_ref())?)
    }

    /// Load store weather observations from a CSV file
    pub fn load_weather<P: AsRef<Path>>(path: P) -> Result<Vec<WeatherRecord>> {
        Self::weather_from_dataframe(&Self::read_csv(path.as_ref())?)
    }

    /// Load store events from a CSV file
    pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
        Self::events_from_dataframe(&Self::read_csv(path.as_ref())?)
    }

    fn read_csv(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            ForecastError::DataSource(format!("Cannot open '{}': {}", path.display(), e))
        })?;

        CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()
            .map_err(|e| {
                ForecastError::DataSource(format!("Cannot read '{}': {}", path.display(), e))
            })
    }

    /// Convert a sales DataFrame into typed records
    pub fn sales_from_dataframe(df: &DataFrame) -> Result<Vec<SalesRecord>> {
        let dates = column_as_dates(required(df, "date", "sales")?)?;
        let stores = column_as_labels(required(df, "store_id", "sales")?)?;
        let products = column_as_labels(required(df, "product", "sales")?)?;
        let quantities = column_as_f64(required(df, "sales_quantity", "sales")?)?;

        let height = df.height();
        let event_impact = optional_f64(df, SalesColumn::EventImpact.name(), height)?;
        let temperature = optional_f64(df, SalesColumn::Temperature.name(), height)?;
        let is_rainy = optional_flag(df, SalesColumn::IsRainy.name(), height)?;
        let is_weekend = optional_flag(df, SalesColumn::IsWeekend.name(), height)?;
        let season = match df.column(SalesColumn::Season.name()) {
            Ok(series) => column_as_labels(series)?,
            Err(_) => vec![None; height],
        };

        let mut records = Vec::with_capacity(height);
        for i in 0..height {
            records.push(SalesRecord {
                date: dates[i],
                store_id: require_value(stores[i].clone(), "store_id", i)?,
                product: require_value(products[i].clone(), "product", i)?,
                sales_quantity: require_value(quantities[i], "sales_quantity", i)?,
                event_impact: event_impact[i],
                season: season[i].clone(),
                temperature: temperature[i],
                is_rainy: is_rainy[i],
                is_weekend: is_weekend[i],
            });
        }

        Ok(records)
    }

    /// Convert a weather DataFrame into typed records
    pub fn weather_from_dataframe(df: &DataFrame) -> Result<Vec<WeatherRecord>> {
        let dates = column_as_dates(required(df, "date", "weather")?)?;
        let stores = column_as_labels(required(df, "store_id", "weather")?)?;
        let humidity = column_as_f64(required(df, "humidity", "weather")?)?;

        dates
            .into_iter()
            .zip(stores)
            .zip(humidity)
            .enumerate()
            .map(|(i, ((date, store_id), humidity))| {
                Ok(WeatherRecord {
                    date,
                    store_id: require_value(store_id, "store_id", i)?,
                    humidity,
                })
            })
            .collect()
    }

    /// Convert an events DataFrame into typed records
    pub fn events_from_dataframe(df: &DataFrame) -> Result<Vec<EventRecord>> {
        let dates = column_as_dates(required(df, "date", "events")?)?;
        let stores = column_as_labels(required(df, "store_id", "events")?)?;
        let impact = column_as_f64(required(df, "impact_multiplier", "events")?)?;

        dates
            .into_iter()
            .zip(stores)
            .zip(impact)
            .enumerate()
            .map(|(i, ((date, store_id), impact_multiplier))| {
                Ok(EventRecord {
                    date,
                    store_id: require_value(store_id, "store_id", i)?,
                    impact_multiplier,
                })
            })
            .collect()
    }
}

fn required<'a>(df: &'a DataFrame, name: &str, source: &str) -> Result<&'a Series> {
    df.column(name).map_err(|_| {
        ForecastError::DataSource(format!(
            "{} source is missing required column '{}'",
            source, name
        ))
    })
}

fn require_value<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| {
        ForecastError::DataSource(format!("Missing value for '{}' at row {}", column, row))
    })
}

fn optional_f64(df: &DataFrame, name: &str, height: usize) -> Result<Vec<Option<f64>>> {
    match df.column(name) {
        Ok(series) => column_as_f64(series),
        Err(_) => Ok(vec![None; height]),
    }
}

fn optional_flag(df: &DataFrame, name: &str, height: usize) -> Result<Vec<Option<bool>>> {
    match df.column(name) {
        Ok(series) => column_as_flag(series),
        Err(_) => Ok(vec![None; height]),
    }
}

fn column_as_f64(series: &Series) -> Result<Vec<Option<f64>>> {
    let values = series.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = values.f64()?.into_iter().collect();
    Ok(values)
}

fn column_as_labels(series: &Series) -> Result<Vec<Option<String>>> {
    let labels = series.cast(&DataType::Utf8)?;
    let labels: Vec<Option<String>> = labels
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(labels)
}

fn column_as_flag(series: &Series) -> Result<Vec<Option<bool>>> {
    match series.dtype() {
        DataType::Boolean => Ok(series.bool()?.into_iter().collect()),
        DataType::Utf8 => Ok(series
            .utf8()?
            .into_iter()
            .map(|v| v.and_then(parse_flag))
            .collect()),
        _ => Ok(column_as_f64(series)?
            .into_iter()
            .map(|v| v.map(|x| x != 0.0))
            .collect()),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn column_as_dates(series: &Series) -> Result<Vec<NaiveDate>> {
    column_as_labels(series)?
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let raw = require_value(raw, series.name(), i)?;
            parse_date(&raw).ok_or_else(|| {
                ForecastError::DataSource(format!("Unparseable date '{}' at row {}", raw, i))
            })
        })
        .collect()
}

/// Parse a `YYYY-MM-DD` date, ignoring any trailing time component
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_tolerates_time_suffix() {
        let expected = NaiveDate::from_ymd_opt(2022, 3, 5);
        assert_eq!(parse_date("2022-03-05"), expected);
        assert_eq!(parse_date("2022-03-05 00:00:00"), expected);
        assert_eq!(parse_date("03/05/2022"), None);
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_optional_columns_detected_from_records() {
        let day = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let mut record = SalesRecord::new(day, "store_001", "ice_cream", 10.0);
        record.season = Some("winter".to_string());

        let sources = DataSources::new(vec![record], Vec::new(), Vec::new());
        assert!(sources.has_sales_column(SalesColumn::Season));
        assert!(!sources.has_sales_column(SalesColumn::Temperature));
    }
}
