//! Wind speed severity buckets and their display colours

use serde::Serialize;
use std::fmt;

/// Wind speed categories used to colour the forecast table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSeverity {
    /// Below 10 km/h
    Low,
    /// 10 up to 20 km/h
    Moderate,
    /// 20 km/h and above
    High,
}

/// One row of the severity table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityBand {
    /// Speeds strictly below this bound fall in the band
    pub upper_bound_kmh: f64,
    pub severity: WindSeverity,
    /// CSS-style hex colour for renderers
    pub color: &'static str,
}

/// Ordered by ascending bound; the last band is open-ended.
pub const SEVERITY_BANDS: [SeverityBand; 3] = [
    SeverityBand {
        upper_bound_kmh: 10.0,
        severity: WindSeverity::Low,
        color: "#2e7d32",
    },
    SeverityBand {
        upper_bound_kmh: 20.0,
        severity: WindSeverity::Moderate,
        color: "#f9a825",
    },
    SeverityBand {
        upper_bound_kmh: f64::INFINITY,
        severity: WindSeverity::High,
        color: "#c62828",
    },
];

fn band_for_speed(speed_kmh: f64) -> &'static SeverityBand {
    SEVERITY_BANDS
        .iter()
        .find(|band| speed_kmh < band.upper_bound_kmh)
        .unwrap_or(&SEVERITY_BANDS[SEVERITY_BANDS.len() - 1])
}

impl WindSeverity {
    /// Bucket a wind speed in km/h. NaN falls through to `High`.
    #[must_use]
    pub fn from_speed(speed_kmh: f64) -> Self {
        band_for_speed(speed_kmh).severity
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        SEVERITY_BANDS
            .iter()
            .find(|band| band.severity == self)
            .map_or(SEVERITY_BANDS[0].color, |band| band.color)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for WindSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
