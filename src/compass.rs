//! Bearing to compass octant conversion
//!
//! Arrows point the way the wind or swell is travelling, so a northerly
//! (coming from 0°) is drawn as `↓`.

use serde::Serialize;
use std::fmt;

/// Width of one octant in degrees
const OCTANT_DEGREES: f64 = 45.0;

/// One of the eight 45° compass sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    /// Octants in index order, 0 = N
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Octant for a bearing: `round(degrees / 45) mod 8` after wrapping the
    /// bearing into `[0, 360)`. Non-finite bearings map to north.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        let bearing = normalize_degrees(degrees);
        // f64::round rounds half away from zero, so 22.5° lands on NE
        let octant = (bearing / OCTANT_DEGREES).round() as usize % Self::ALL.len();
        Self::ALL[octant]
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }

    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Self::N => "↓",
            Self::NE => "↙",
            Self::E => "←",
            Self::SE => "↖",
            Self::S => "↑",
            Self::SW => "↗",
            Self::W => "→",
            Self::NW => "↘",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compass label plus the arrow drawn in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompassArrow {
    pub compass_label: &'static str,
    pub arrow_glyph: &'static str,
}

impl From<CompassPoint> for CompassArrow {
    fn from(point: CompassPoint) -> Self {
        Self {
            compass_label: point.label(),
            arrow_glyph: point.glyph(),
        }
    }
}

impl fmt::Display for CompassArrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.compass_label, self.arrow_glyph)
    }
}

/// Map a bearing in degrees to its compass label and arrow glyph
#[must_use]
pub fn degrees_to_compass_arrow(degrees: f64) -> CompassArrow {
    CompassPoint::from_degrees(degrees).into()
}

/// Wrap any bearing into `[0, 360)`
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative value can round up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
