//! `swellcast` - Marine and wind forecast lookup
//!
//! This library resolves a place name through geocoding, fetches the marine
//! and atmospheric forecasts for it concurrently, and merges them into hourly
//! rows annotated with compass arrows, wind severity and a current-hour flag.

pub mod aggregator;
pub mod compass;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod openmeteo;
pub mod session;
pub mod severity;

#[cfg(test)]
mod test_support;

// Re-export core types for public API
pub use aggregator::{ForecastAggregator, MergePolicy, merge_and_annotate};
pub use compass::{CompassArrow, CompassPoint, degrees_to_compass_arrow};
pub use config::SwellcastConfig;
pub use error::{Collaborator, ForecastError, UpstreamFailure};
pub use http::{JsonFetcher, ReqwestFetcher};
pub use models::{ForecastReport, Location, MergedForecastRow};
pub use openmeteo::OpenMeteoClient;
pub use session::{LookupOutcome, LookupSession, LookupTicket};
pub use severity::{SEVERITY_BANDS, WindSeverity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
