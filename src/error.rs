//! Error types and handling for the `swellcast` forecast lookup

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream service that took part in a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    /// Place name to coordinates lookup
    Geocoding,
    /// Hourly wave forecast
    Marine,
    /// Hourly wind/temperature forecast plus daily summary
    Atmospheric,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Geocoding => "geocoding",
            Self::Marine => "marine forecast",
            Self::Atmospheric => "weather forecast",
        };
        f.write_str(name)
    }
}

/// Why an upstream call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Transport-level failure (DNS, connection reset, TLS, ...)
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Body could not be decoded into the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No response within the configured bound
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

/// Main error type for the forecast lookup
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Query rejected before any network call
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Geocoding returned no candidates
    #[error("Location not found: {query}")]
    NotFound { query: String },

    /// One of the upstream services failed
    #[error("{collaborator} request failed: {reason}")]
    Upstream {
        collaborator: Collaborator,
        reason: UpstreamFailure,
    },

    /// Marine and atmospheric series cannot be lined up
    #[error("Partial data: {message}")]
    PartialData { message: String },

    /// The wave model has no hours for the place while the wind model does
    #[error("No marine data: the wave model has no forecast for this location")]
    NoMarineData,

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ForecastError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    pub fn upstream(collaborator: Collaborator, reason: UpstreamFailure) -> Self {
        Self::Upstream {
            collaborator,
            reason,
        }
    }

    /// Shorthand for a payload that decoded but did not make sense
    pub fn malformed<S: Into<String>>(collaborator: Collaborator, message: S) -> Self {
        Self::upstream(collaborator, UpstreamFailure::Malformed(message.into()))
    }

    pub fn partial_data<S: Into<String>>(message: S) -> Self {
        Self::PartialData {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::InvalidInput { message } => format!("Invalid input: {message}"),
            ForecastError::NotFound { query } => {
                format!("No place called '{query}' was found. Check the spelling and try again.")
            }
            ForecastError::Upstream {
                collaborator,
                reason: UpstreamFailure::Timeout(_),
            } => format!("The {collaborator} service did not answer in time. Please try again."),
            ForecastError::Upstream { collaborator, .. } => format!(
                "Unable to get data from the {collaborator} service. Please check your internet connection."
            ),
            ForecastError::PartialData { .. } => {
                "The marine and weather forecasts do not line up for this place.".to_string()
            }
            ForecastError::NoMarineData => {
                "No wave forecast is available for this place. It may be too far inland."
                    .to_string()
            }
            ForecastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
        }
    }
}
