//! Feature engineering for per-segment demand models
//!
//! The builder joins the three sources, sorts rows by
//! `(store_id, product, date)`, derives calendar, lag, rolling and encoded
//! categorical columns, and exposes the result as a [`FeatureTable`].
//! Lags and rolling means are computed inside each segment only; a row never
//! sees sales from another store or product.
//!
//! [`FeatureSchema::vector`] is the only place a row is turned into model
//! input, and both training and forecasting go through it.

use crate::config::{FillStrategy, ForecastConfig};
use crate::data::{DataSources, SalesColumn};
use crate::error::{ForecastError, Result};
use crate::registry::SegmentKey;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Range;
use tracing::{debug, info};

/// Label used for rows without a season when fitting the season encoding
pub const UNKNOWN_SEASON: &str = "unknown";

/// A single model input column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureColumn {
    Temperature,
    IsRainy,
    Humidity,
    IsWeekend,
    EventImpact,
    DayOfWeek,
    DayOfMonth,
    Month,
    Year,
    /// Sales `n` rows earlier in the same segment
    SalesLag(usize),
    /// Mean sales over the trailing `n` rows of the same segment
    SalesRolling(usize),
    ProductEncoded,
    SeasonEncoded,
    StoreIdEncoded,
}

impl FeatureColumn {
    /// Optional sales column this feature cannot be built without
    pub fn required_sales_column(&self) -> Option<SalesColumn> {
        match self {
            FeatureColumn::Temperature => Some(SalesColumn::Temperature),
            FeatureColumn::IsRainy => Some(SalesColumn::IsRainy),
            FeatureColumn::SeasonEncoded => Some(SalesColumn::Season),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureColumn::Temperature => write!(f, "temperature"),
            FeatureColumn::IsRainy => write!(f, "is_rainy"),
            FeatureColumn::Humidity => write!(f, "humidity"),
            FeatureColumn::IsWeekend => write!(f, "is_weekend"),
            FeatureColumn::EventImpact => write!(f, "final_event_impact"),
            FeatureColumn::DayOfWeek => write!(f, "day_of_week"),
            FeatureColumn::DayOfMonth => write!(f, "day_of_month"),
            FeatureColumn::Month => write!(f, "month"),
            FeatureColumn::Year => write!(f, "year"),
            FeatureColumn::SalesLag(w) => write!(f, "sales_lag_{}", w),
            FeatureColumn::SalesRolling(w) => write!(f, "sales_rolling_{}", w),
            FeatureColumn::ProductEncoded => write!(f, "product_encoded"),
            FeatureColumn::SeasonEncoded => write!(f, "season_encoded"),
            FeatureColumn::StoreIdEncoded => write!(f, "store_id_encoded"),
        }
    }
}

/// Fixed, ordered set of model input columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    /// Create a schema, rejecting empty or duplicated column lists
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::Schema(
                "Feature schema must contain at least one column".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(*column) {
                return Err(ForecastError::Schema(format!(
                    "Duplicate feature column '{}'",
                    column
                )));
            }
        }

        Ok(Self { columns })
    }

    /// The standard demand schema: weather, event, calendar, lag, rolling and encoded columns
    pub fn standard(windows: &[usize]) -> Result<Self> {
        let mut columns = vec![
            FeatureColumn::Temperature,
            FeatureColumn::IsRainy,
            FeatureColumn::Humidity,
            FeatureColumn::IsWeekend,
            FeatureColumn::EventImpact,
            FeatureColumn::DayOfWeek,
            FeatureColumn::DayOfMonth,
            FeatureColumn::Month,
        ];
        columns.extend(windows.iter().map(|&w| FeatureColumn::SalesLag(w)));
        columns.extend(windows.iter().map(|&w| FeatureColumn::SalesRolling(w)));
        columns.extend([
            FeatureColumn::ProductEncoded,
            FeatureColumn::SeasonEncoded,
            FeatureColumn::StoreIdEncoded,
        ]);

        Self::new(columns)
    }

    /// Columns in model input order
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Column names in model input order
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }

    /// Number of model inputs
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for a validated schema
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Assemble a row's model input in schema order
    pub fn vector(&self, row: &FeatureRow) -> Vec<f64> {
        self.columns.iter().map(|&c| row.value(c)).collect()
    }

    fn windows(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().filter_map(|c| match c {
            FeatureColumn::SalesLag(w) | FeatureColumn::SalesRolling(w) => Some(*w),
            _ => None,
        })
    }
}

/// Calendar fields derived from a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub year: i32,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day_of_week: date.weekday().num_days_from_monday(),
            day_of_month: date.day(),
            month: date.month(),
            year: date.year(),
        }
    }

    /// Saturday or Sunday
    pub fn is_weekend(&self) -> bool {
        self.day_of_week >= Weekday::Sat.num_days_from_monday()
    }
}

/// Label to integer code mapping, codes assigned in sorted label order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalEncoding {
    codes: BTreeMap<String, u32>,
}

impl CategoricalEncoding {
    /// Fit an encoding over every label in the table
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = labels.into_iter().collect();
        let codes = unique
            .into_iter()
            .enumerate()
            .map(|(code, label)| (label.to_string(), code as u32))
            .collect();

        Self { codes }
    }

    /// Code for a label seen at fit time
    pub fn encode(&self, label: &str) -> Option<u32> {
        self.codes.get(label).copied()
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Fitted encodings for the categorical columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalEncodings {
    pub product: CategoricalEncoding,
    pub season: CategoricalEncoding,
    pub store_id: CategoricalEncoding,
}

impl CategoricalEncodings {
    /// Fit all three encodings over the merged table
    pub fn fit(records: &[MergedRecord]) -> Self {
        Self {
            product: CategoricalEncoding::fit(records.iter().map(|r| r.product.as_str())),
            season: CategoricalEncoding::fit(records.iter().map(|r| r.season_label())),
            store_id: CategoricalEncoding::fit(records.iter().map(|r| r.store_id.as_str())),
        }
    }

    fn encode(encoding: &CategoricalEncoding, column: &str, label: &str) -> Result<u32> {
        encoding.encode(label).ok_or_else(|| {
            ForecastError::Schema(format!("Unseen {} category '{}'", column, label))
        })
    }
}

/// A sales row with weather and event data joined on
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub store_id: String,
    pub product: String,
    pub season: Option<String>,
    pub sales_quantity: f64,
    pub temperature: Option<f64>,
    pub is_rainy: Option<bool>,
    pub is_weekend: Option<bool>,
    pub humidity: Option<f64>,
    /// Sales-reported impact, else the events impact, else 1.0
    pub event_impact: f64,
}

impl MergedRecord {
    fn season_label(&self) -> &str {
        self.season.as_deref().unwrap_or(UNKNOWN_SEASON)
    }

    fn segment_key(&self) -> SegmentKey {
        SegmentKey::new(&self.store_id, &self.product)
    }
}

/// Left join humidity and event impact onto sales by `(date, store_id)`.
///
/// When a source has several rows for one key the first row carrying a
/// value wins, so the output always has exactly one row per sales row.
pub fn merge(sources: &DataSources) -> Vec<MergedRecord> {
    let mut humidity: HashMap<(NaiveDate, &str), f64> = HashMap::new();
    for record in sources.weather() {
        if let Some(value) = record.humidity {
            humidity
                .entry((record.date, record.store_id.as_str()))
                .or_insert(value);
        }
    }

    let mut impact: HashMap<(NaiveDate, &str), f64> = HashMap::new();
    for record in sources.events() {
        if let Some(value) = record.impact_multiplier {
            impact
                .entry((record.date, record.store_id.as_str()))
                .or_insert(value);
        }
    }

    sources
        .sales()
        .iter()
        .map(|sale| {
            let key = (sale.date, sale.store_id.as_str());
            let event_impact = sale
                .event_impact
                .or_else(|| impact.get(&key).copied())
                .unwrap_or(1.0);

            MergedRecord {
                date: sale.date,
                store_id: sale.store_id.clone(),
                product: sale.product.clone(),
                season: sale.season.clone(),
                sales_quantity: sale.sales_quantity,
                temperature: sale.temperature,
                is_rainy: sale.is_rainy,
                is_weekend: sale.is_weekend,
                humidity: humidity.get(&key).copied(),
                event_impact,
            }
        })
        .collect()
}

/// Sort rows by `(store_id, product, date)` and return each segment's row range
pub fn sort_into_segments(records: &mut [MergedRecord]) -> BTreeMap<SegmentKey, Range<usize>> {
    records.sort_by(|a, b| {
        (a.store_id.as_str(), a.product.as_str(), a.date).cmp(&(
            b.store_id.as_str(),
            b.product.as_str(),
            b.date,
        ))
    });

    let mut segments = BTreeMap::new();
    let mut start = 0;
    for i in 1..=records.len() {
        if i == records.len()
            || records[i].store_id != records[start].store_id
            || records[i].product != records[start].product
        {
            segments.insert(records[start].segment_key(), start..i);
            start = i;
        }
    }

    segments
}

/// Lag and rolling columns aligned with the sorted table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowColumns {
    pub lags: BTreeMap<usize, Vec<Option<f64>>>,
    pub rolling: BTreeMap<usize, Vec<Option<f64>>>,
}

/// Compute lag and rolling columns for each window, segment by segment.
///
/// `records` must already be sorted by [`sort_into_segments`].
pub fn derive_lag_and_rolling(
    records: &[MergedRecord],
    segments: &BTreeMap<SegmentKey, Range<usize>>,
    windows: &[usize],
) -> Result<WindowColumns> {
    let mut columns = WindowColumns::default();

    for &window in windows {
        let mut lags = vec![None; records.len()];
        let mut rolling = vec![None; records.len()];

        for range in segments.values() {
            let sales: Vec<f64> = records[range.clone()]
                .iter()
                .map(|r| r.sales_quantity)
                .collect();

            lags[range.clone()].copy_from_slice(&demand_math::lag(&sales, window)?);
            rolling[range.clone()].copy_from_slice(&demand_math::rolling_mean(&sales, window)?);
        }

        columns.lags.insert(window, lags);
        columns.rolling.insert(window, rolling);
    }

    Ok(columns)
}

/// Fill a sorted column forward, backward, then with zero
pub fn fill_column(
    values: Vec<Option<f64>>,
    segments: &BTreeMap<SegmentKey, Range<usize>>,
    strategy: FillStrategy,
) -> Vec<f64> {
    match strategy {
        FillStrategy::TableWide => demand_math::fill_missing(values),
        FillStrategy::PerSegment => {
            let mut filled = vec![0.0; values.len()];
            for range in segments.values() {
                let segment = demand_math::fill_missing(values[range.clone()].to_vec());
                filled[range.clone()].copy_from_slice(&segment);
            }
            filled
        }
    }
}

/// A fully engineered row, ready for model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub store_id: String,
    pub product: String,
    pub season: Option<String>,
    /// Target value
    pub sales_quantity: f64,
    pub temperature: f64,
    pub is_rainy: f64,
    pub humidity: f64,
    pub is_weekend: f64,
    pub event_impact: f64,
    pub calendar: CalendarFeatures,
    pub lags: BTreeMap<usize, f64>,
    pub rolling: BTreeMap<usize, f64>,
    pub product_code: u32,
    pub season_code: u32,
    pub store_code: u32,
}

impl FeatureRow {
    /// Value of a single feature column; windows the row lacks read as 0
    pub fn value(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::Temperature => self.temperature,
            FeatureColumn::IsRainy => self.is_rainy,
            FeatureColumn::Humidity => self.humidity,
            FeatureColumn::IsWeekend => self.is_weekend,
            FeatureColumn::EventImpact => self.event_impact,
            FeatureColumn::DayOfWeek => self.calendar.day_of_week as f64,
            FeatureColumn::DayOfMonth => self.calendar.day_of_month as f64,
            FeatureColumn::Month => self.calendar.month as f64,
            FeatureColumn::Year => self.calendar.year as f64,
            FeatureColumn::SalesLag(w) => self.lags.get(&w).copied().unwrap_or(0.0),
            FeatureColumn::SalesRolling(w) => self.rolling.get(&w).copied().unwrap_or(0.0),
            FeatureColumn::ProductEncoded => self.product_code as f64,
            FeatureColumn::SeasonEncoded => self.season_code as f64,
            FeatureColumn::StoreIdEncoded => self.store_code as f64,
        }
    }

    /// The segment this row belongs to
    pub fn segment_key(&self) -> SegmentKey {
        SegmentKey::new(&self.store_id, &self.product)
    }
}

/// Engineered rows sorted by `(store_id, product, date)`, with segment index and encodings
#[derive(Debug, Clone)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    segments: BTreeMap<SegmentKey, Range<usize>>,
    encodings: CategoricalEncodings,
}

impl FeatureTable {
    /// All rows in segment order
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Encodings fitted over the whole table
    pub fn encodings(&self) -> &CategoricalEncodings {
        &self.encodings
    }

    /// Segment keys in sorted order
    pub fn segment_keys(&self) -> impl Iterator<Item = &SegmentKey> {
        self.segments.keys()
    }

    /// Rows of one segment in date order, empty if the segment is unknown
    pub fn segment(&self, key: &SegmentKey) -> &[FeatureRow] {
        match self.segments.get(key) {
            Some(range) => &self.rows[range.clone()],
            None => &[],
        }
    }

    /// The most recent `n` rows of a segment, in date order
    pub fn segment_tail(&self, key: &SegmentKey, n: usize) -> &[FeatureRow] {
        let rows = self.segment(key);
        &rows[rows.len().saturating_sub(n)..]
    }
}

/// Builds the feature table for a fixed schema
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
    windows: Vec<usize>,
    fill_strategy: FillStrategy,
}

impl FeatureBuilder {
    /// Create a builder; every window the schema references must be one the config computes
    pub fn new(schema: FeatureSchema, config: &ForecastConfig) -> Result<Self> {
        config.validate()?;

        if let Some(window) = schema.windows().find(|w| !config.windows.contains(w)) {
            return Err(ForecastError::Schema(format!(
                "Schema uses window {} but only {:?} are computed",
                window, config.windows
            )));
        }

        Ok(Self {
            schema,
            windows: config.windows.clone(),
            fill_strategy: config.fill_strategy,
        })
    }

    /// The schema every model built from this table is bound to
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Fail if a schema column needs a sales column the sources don't provide
    pub fn check_sources(&self, sources: &DataSources) -> Result<()> {
        let missing: Vec<String> = self
            .schema
            .columns()
            .iter()
            .filter_map(|c| c.required_sales_column().map(|s| (c, s)))
            .filter(|(_, s)| !sources.has_sales_column(*s))
            .map(|(c, s)| format!("{} (needs '{}')", c, s.name()))
            .collect();

        if !missing.is_empty() {
            return Err(ForecastError::Schema(format!(
                "Sales source cannot provide feature columns: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    /// Merge, sort, derive, fill and encode the sources into a feature table
    pub fn build(&self, sources: &DataSources) -> Result<FeatureTable> {
        self.check_sources(sources)?;

        let mut records = merge(sources);
        let segments = sort_into_segments(&mut records);
        debug!(rows = records.len(), segments = segments.len(), "merged sources");

        let windows = derive_lag_and_rolling(&records, &segments, &self.windows)?;
        let strategy = self.fill_strategy;

        let temperature = fill_column(
            records.iter().map(|r| r.temperature).collect(),
            &segments,
            strategy,
        );
        let humidity = fill_column(
            records.iter().map(|r| r.humidity).collect(),
            &segments,
            strategy,
        );
        let lags: BTreeMap<usize, Vec<f64>> = windows
            .lags
            .into_iter()
            .map(|(w, column)| (w, fill_column(column, &segments, strategy)))
            .collect();
        let rolling: BTreeMap<usize, Vec<f64>> = windows
            .rolling
            .into_iter()
            .map(|(w, column)| (w, fill_column(column, &segments, strategy)))
            .collect();

        let encodings = CategoricalEncodings::fit(&records);

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let calendar = CalendarFeatures::from_date(record.date);
            let product_code =
                CategoricalEncodings::encode(&encodings.product, "product", &record.product)?;
            let season_code =
                CategoricalEncodings::encode(&encodings.season, "season", record.season_label())?;
            let store_code =
                CategoricalEncodings::encode(&encodings.store_id, "store_id", &record.store_id)?;

            rows.push(FeatureRow {
                date: record.date,
                store_id: record.store_id,
                product: record.product,
                season: record.season,
                sales_quantity: record.sales_quantity,
                temperature: temperature[i],
                is_rainy: flag(record.is_rainy.unwrap_or(false)),
                humidity: humidity[i],
                is_weekend: flag(record.is_weekend.unwrap_or_else(|| calendar.is_weekend())),
                event_impact: record.event_impact,
                calendar,
                lags: lags.iter().map(|(&w, column)| (w, column[i])).collect(),
                rolling: rolling.iter().map(|(&w, column)| (w, column[i])).collect(),
                product_code,
                season_code,
                store_code,
            });
        }

        info!(
            rows = rows.len(),
            segments = segments.len(),
            features = self.schema.len(),
            "built feature table"
        );
        debug!(columns = ?self.schema.names(), "feature columns");

        Ok(FeatureTable {
            rows,
            segments,
            encodings,
        })
    }
}

/// 1.0 for true, 0.0 for false
pub fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
