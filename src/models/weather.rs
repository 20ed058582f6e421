//! Hourly marine/atmospheric samples and the daily summary

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One hour of wave data
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyMarineSample {
    /// Local time in the forecast timezone
    pub timestamp: NaiveDateTime,
    /// Significant wave height in metres
    pub wave_height_m: f64,
    /// Wave period in seconds
    pub wave_period_s: f64,
    /// Direction the waves come from, degrees (0 is North)
    pub wave_direction_deg: f64,
}

/// One hour of wind (and optionally temperature) data
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourlyAtmosphericSample {
    /// Local time in the forecast timezone
    pub timestamp: NaiveDateTime,
    /// Wind speed at 10m in km/h
    pub wind_speed_kmh: f64,
    /// Direction the wind comes from, degrees (0 is North)
    pub wind_direction_deg: f64,
    /// Air temperature at 2m in Celsius, when requested
    pub temperature_c: Option<f64>,
}

/// Daily temperature range and daylight window
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

impl DailySummary {
    /// Format temperature range with unit
    #[must_use]
    pub fn format_temperature_range(&self) -> String {
        format!("{:.1}°C / {:.1}°C", self.temp_min_c, self.temp_max_c)
    }

    /// Format sunrise and sunset as "HH:MM - HH:MM"
    #[must_use]
    pub fn format_daylight(&self) -> String {
        format!(
            "{} - {}",
            self.sunrise.format("%H:%M"),
            self.sunset.format("%H:%M")
        )
    }
}

/// Hourly wave forecast, chronological
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MarineSeries {
    /// Timezone the upstream used for the timestamps
    pub timezone: String,
    pub samples: Vec<HourlyMarineSample>,
}

/// Hourly wind forecast, chronological
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AtmosphericSeries {
    /// Timezone the upstream used for the timestamps
    pub timezone: String,
    pub samples: Vec<HourlyAtmosphericSample>,
}

/// Atmospheric forecast response: hourly series plus the optional daily block
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AtmosphericForecast {
    pub hourly: AtmosphericSeries,
    /// Empty when daily fields were not requested
    pub daily: Vec<DailySummary>,
}
