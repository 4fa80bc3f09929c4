//! # Demand Forecast Workspace
//!
//! Umbrella crate for the workspace members.
//!
//! - [`demand_forecast`]: loading, feature building, per-segment training and forecasting
//! - [`demand_math`]: lag, rolling window, fill and accuracy metric helpers
//!
//! ```
//! use demand_forecast_workspace::demand_math::lag;
//!
//! let lagged = lag(&[1.0, 2.0, 3.0], 1).unwrap();
//! assert_eq!(lagged, vec![None, Some(1.0), Some(2.0)]);
//! ```

pub use demand_forecast;
pub use demand_math;
