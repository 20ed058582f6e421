//! Merged hourly rows and the lookup report

use super::{DailySummary, Location};
use crate::compass::CompassArrow;
use crate::severity::WindSeverity;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

/// One hour of combined marine + wind data with presentation fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedForecastRow {
    pub timestamp: NaiveDateTime,
    pub wave_height_m: f64,
    pub wave_period_s: f64,
    pub wave_direction: CompassArrow,
    pub wind_speed_kmh: f64,
    pub wind_severity: WindSeverity,
    pub wind_direction: CompassArrow,
    pub temperature_c: Option<f64>,
    pub is_current_hour: bool,
}

impl MergedForecastRow {
    /// Short local time, e.g. "1/3 at 14:00"
    #[must_use]
    pub fn format_time(&self) -> String {
        format!(
            "{}/{} at {:02}:{:02}",
            self.timestamp.day(),
            self.timestamp.month(),
            self.timestamp.hour(),
            self.timestamp.minute()
        )
    }
}

/// True when both times share calendar year, month, day and hour
#[must_use]
pub fn is_same_hour(timestamp: NaiveDateTime, now: NaiveDateTime) -> bool {
    timestamp.date() == now.date() && timestamp.hour() == now.hour()
}

/// Everything a successful lookup produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub location: Location,
    /// IANA timezone the row timestamps are expressed in
    pub timezone: String,
    pub rows: Vec<MergedForecastRow>,
    pub daily: Vec<DailySummary>,
}

impl ForecastReport {
    /// Row flagged as the current hour, if the forecast covers it
    #[must_use]
    pub fn current_row(&self) -> Option<&MergedForecastRow> {
        self.rows.iter().find(|row| row.is_current_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compass::degrees_to_compass_arrow;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap()
    }

    #[test]
    fn test_same_hour() {
        assert!(is_same_hour(at(1, 14, 7), at(1, 14, 45)));
        assert!(!is_same_hour(at(1, 14, 7), at(1, 15, 0)));
        assert!(!is_same_hour(at(1, 14, 7), at(2, 14, 7)));
    }

    #[test]
    fn test_format_time() {
        let row = MergedForecastRow {
            timestamp: at(1, 9, 0),
            wave_height_m: 1.2,
            wave_period_s: 8.5,
            wave_direction: degrees_to_compass_arrow(135.0),
            wind_speed_kmh: 12.0,
            wind_severity: WindSeverity::Moderate,
            wind_direction: degrees_to_compass_arrow(200.0),
            temperature_c: None,
            is_current_hour: false,
        };
        assert_eq!(row.format_time(), "1/3 at 09:00");
    }
}
