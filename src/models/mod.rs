//! Data models for the swellcast lookup
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and metadata
//! - Weather: Hourly marine/atmospheric samples and daily summaries
//! - Forecast: Merged rows and the lookup report

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{ForecastReport, MergedForecastRow, is_same_hour};
pub use location::Location;
pub use weather::{
    AtmosphericForecast, AtmosphericSeries, DailySummary, HourlyAtmosphericSample,
    HourlyMarineSample, MarineSeries,
};
