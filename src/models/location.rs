//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Location name (city, beach, region, etc.)
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Country name as reported by the geocoder
    pub country: Option<String>,
    /// First-level administrative area (state, province)
    pub region: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            name,
            latitude,
            longitude,
            country: None,
            region: None,
        }
    }

    /// Name with region and country appended when known,
    /// e.g. "Sydney, New South Wales, Australia"
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        for extra in [&self.region, &self.country].into_iter().flatten() {
            if !extra.is_empty() && extra != &self.name {
                parts.push(extra);
            }
        }
        parts.join(", ")
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
