//! Configuration management for `swellcast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::ForecastError;
use crate::aggregator::MergePolicy;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwellcastConfig {
    /// Upstream endpoint URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    /// HTTP request settings
    #[serde(default)]
    pub request: RequestConfig,
    /// Forecast selection and merge settings
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Open-Meteo endpoints; overridable for self-hosted instances and tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_marine_url")]
    pub marine_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
}

/// HTTP request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Number of geocoding candidates to ask for; the first one is used
    #[serde(default = "default_geocoding_limit")]
    pub geocoding_limit: u32,
}

/// Forecast request and merge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// IANA timezone for all returned timestamps
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Request hourly air temperature alongside wind
    #[serde(default = "default_true")]
    pub include_temperature: bool,
    /// Request the daily max/min temperature and sunrise/sunset block
    #[serde(default = "default_true")]
    pub include_daily: bool,
    /// Largest series length difference that is truncated rather than rejected
    #[serde(default = "default_max_length_skew")]
    pub max_length_skew: usize,
    /// Reject series whose timestamps differ at the same position
    #[serde(default = "default_true")]
    pub verify_timestamps: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_marine_url() -> String {
    "https://marine-api.open-meteo.com/v1/marine".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_geocoding_limit() -> u32 {
    1
}

fn default_timezone() -> String {
    "Australia/Sydney".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_length_skew() -> usize {
    48
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            marine_url: default_marine_url(),
            forecast_url: default_forecast_url(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            geocoding_limit: default_geocoding_limit(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            include_temperature: true,
            include_daily: true,
            max_length_skew: default_max_length_skew(),
            verify_timestamps: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl RequestConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ForecastConfig {
    /// Parsed timezone; `validate` guarantees this succeeds for loaded configs
    pub fn tz(&self) -> Result<Tz, ForecastError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ForecastError::config(format!("Unknown timezone '{}'", self.timezone)))
    }

    #[must_use]
    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            max_length_skew: self.max_length_skew,
            verify_timestamps: self.verify_timestamps,
        }
    }
}

impl SwellcastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SWELLCAST_REQUEST__TIMEOUT_SECONDS=5
        builder = builder.add_source(
            Environment::with_prefix("SWELLCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SwellcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("swellcast").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.endpoints.geocoding_url.is_empty() {
            self.endpoints.geocoding_url = default_geocoding_url();
        }
        if self.endpoints.marine_url.is_empty() {
            self.endpoints.marine_url = default_marine_url();
        }
        if self.endpoints.forecast_url.is_empty() {
            self.endpoints.forecast_url = default_forecast_url();
        }
        if self.request.timeout_seconds == 0 {
            self.request.timeout_seconds = default_timeout();
        }
        if self.request.geocoding_limit == 0 {
            self.request.geocoding_limit = default_geocoding_limit();
        }
        if self.forecast.timezone.is_empty() {
            self.forecast.timezone = default_timezone();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.request.timeout_seconds > 300 {
            return Err(ForecastError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if self.request.geocoding_limit > 100 {
            return Err(ForecastError::config("Geocoding limit cannot exceed 100").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ForecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geocoding", &self.endpoints.geocoding_url),
            ("marine", &self.endpoints.marine_url),
            ("forecast", &self.endpoints.forecast_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ForecastError::config(format!(
                    "The {name} endpoint must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        self.forecast.tz()?;

        Ok(())
    }
}
