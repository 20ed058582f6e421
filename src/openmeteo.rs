//! Open-Meteo collaborators: geocoding, marine and atmospheric forecasts
//!
//! Each lookup builds a URL from the configured endpoint, fetches it through
//! a [`JsonFetcher`] and converts the payload into internal models. Payload
//! problems surface as [`UpstreamFailure::Malformed`] tagged with the
//! collaborator that produced them.

use crate::config::SwellcastConfig;
use crate::error::{Collaborator, ForecastError, UpstreamFailure};
use crate::http::JsonFetcher;
use crate::models::{
    AtmosphericForecast, AtmosphericSeries, DailySummary, HourlyAtmosphericSample,
    HourlyMarineSample, Location, MarineSeries,
};
use crate::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const MARINE_HOURLY_FIELDS: &str = "wave_height,wave_direction,wave_period";
const WIND_HOURLY_FIELDS: &str = "wind_speed_10m,wind_direction_10m";
const TEMPERATURE_HOURLY_FIELD: &str = "temperature_2m";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,sunrise,sunset";

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        Location {
            name: result.name,
            latitude: result.latitude,
            longitude: result.longitude,
            country: result.country,
            region: result.admin1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarineResponse {
    timezone: Option<String>,
    hourly: MarineHourly,
}

#[derive(Debug, Deserialize)]
struct MarineHourly {
    time: Vec<String>,
    wave_height: Vec<Option<f64>>,
    wave_direction: Vec<Option<f64>>,
    wave_period: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    timezone: Option<String>,
    hourly: AtmosphericHourly,
    daily: Option<DailyData>,
}

#[derive(Debug, Deserialize)]
struct AtmosphericHourly {
    time: Vec<String>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    temperature_2m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
}

/// Client for the three Open-Meteo lookups, generic over the transport
#[derive(Debug, Clone)]
pub struct OpenMeteoClient<F> {
    fetcher: F,
    config: SwellcastConfig,
}

impl<F: JsonFetcher> OpenMeteoClient<F> {
    pub fn new(fetcher: F, config: SwellcastConfig) -> Self {
        Self { fetcher, config }
    }

    pub(crate) fn geocoding_url(&self, name: &str, limit: u32) -> String {
        format!(
            "{}?name={}&count={}&language=en&format=json",
            self.config.endpoints.geocoding_url,
            urlencoding::encode(name),
            limit
        )
    }

    pub(crate) fn marine_url(&self, location: &Location) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&timezone={}",
            self.config.endpoints.marine_url,
            location.latitude,
            location.longitude,
            MARINE_HOURLY_FIELDS,
            urlencoding::encode(&self.config.forecast.timezone)
        )
    }

    pub(crate) fn forecast_url(&self, location: &Location) -> String {
        let forecast = &self.config.forecast;
        let mut hourly = WIND_HOURLY_FIELDS.to_string();
        if forecast.include_temperature {
            hourly.push(',');
            hourly.push_str(TEMPERATURE_HOURLY_FIELD);
        }

        let mut url = format!(
            "{}?latitude={}&longitude={}&hourly={}",
            self.config.endpoints.forecast_url, location.latitude, location.longitude, hourly
        );
        if forecast.include_daily {
            url.push_str("&daily=");
            url.push_str(DAILY_FIELDS);
        }
        url.push_str("&timezone=");
        url.push_str(&urlencoding::encode(&forecast.timezone));
        url
    }

    /// Candidate locations for a place name, best match first
    #[instrument(skip(self), fields(location = name))]
    pub async fn geocode(&self, name: &str, limit: u32) -> Result<Vec<Location>> {
        info!("Geocoding location: '{}'", name);
        let start_time = Instant::now();

        let url = self.geocoding_url(name, limit);
        let response: GeocodingResponse = self.get(Collaborator::Geocoding, &url).await?;

        let locations: Vec<Location> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(Location::from)
            .collect();

        if locations.is_empty() {
            warn!("No results found for location '{}'", name);
        } else {
            info!(
                "Found {} geocoding results for '{}' in {:.3}s",
                locations.len(),
                name,
                start_time.elapsed().as_secs_f64()
            );
            debug!(
                "Geocoding results: {:?}",
                locations
                    .iter()
                    .map(|l| format!("{} ({})", l.name, l.format_coordinates()))
                    .collect::<Vec<_>>()
            );
        }

        Ok(locations)
    }

    /// Hourly wave height, period and direction
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn marine(&self, location: &Location) -> Result<MarineSeries> {
        let start_time = Instant::now();
        let url = self.marine_url(location);
        let response: MarineResponse = self.get(Collaborator::Marine, &url).await?;

        let series = convert_marine(response, &self.config.forecast.timezone)?;
        info!(
            "Retrieved {} marine samples in {:.3}s",
            series.samples.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(series)
    }

    /// Hourly wind (and temperature) plus the daily summary when configured
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn atmospheric(&self, location: &Location) -> Result<AtmosphericForecast> {
        let start_time = Instant::now();
        let url = self.forecast_url(location);
        let response: ForecastResponse = self.get(Collaborator::Atmospheric, &url).await?;

        let forecast = convert_atmospheric(
            response,
            &self.config.forecast.timezone,
            self.config.forecast.include_daily,
        )?;
        info!(
            "Retrieved {} atmospheric samples and {} days in {:.3}s",
            forecast.hourly.samples.len(),
            forecast.daily.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(forecast)
    }

    async fn get<T: DeserializeOwned>(&self, collaborator: Collaborator, url: &str) -> Result<T> {
        debug!("OpenMeteo {} request URL: {}", collaborator, url);

        let body: Value = self
            .fetcher
            .fetch_json(url)
            .await
            .map_err(|reason| ForecastError::upstream(collaborator, reason))?;

        serde_json::from_value(body).map_err(|e| {
            warn!("Failed to parse {} response: {}", collaborator, e);
            ForecastError::upstream(collaborator, UpstreamFailure::Malformed(e.to_string()))
        })
    }
}

fn convert_marine(response: MarineResponse, fallback_timezone: &str) -> Result<MarineSeries> {
    let collaborator = Collaborator::Marine;
    let hourly = response.hourly;
    let len = hourly.time.len();
    ensure_lengths(
        collaborator,
        len,
        &[
            ("wave_height", hourly.wave_height.len()),
            ("wave_direction", hourly.wave_direction.len()),
            ("wave_period", hourly.wave_period.len()),
        ],
    )?;

    let usable = complete_prefix(collaborator, len, |i| {
        hourly.wave_height[i].is_some()
            && hourly.wave_direction[i].is_some()
            && hourly.wave_period[i].is_some()
    })?;

    let mut samples = Vec::with_capacity(usable);
    for i in 0..usable {
        // complete_prefix guarantees all three values are present
        let (Some(height), Some(direction), Some(period)) = (
            hourly.wave_height[i],
            hourly.wave_direction[i],
            hourly.wave_period[i],
        ) else {
            continue;
        };
        samples.push(HourlyMarineSample {
            timestamp: parse_local_time(collaborator, &hourly.time[i])?,
            wave_height_m: height,
            wave_period_s: period,
            wave_direction_deg: direction,
        });
    }

    Ok(MarineSeries {
        timezone: response
            .timezone
            .unwrap_or_else(|| fallback_timezone.to_string()),
        samples,
    })
}

fn convert_atmospheric(
    response: ForecastResponse,
    fallback_timezone: &str,
    daily_requested: bool,
) -> Result<AtmosphericForecast> {
    let collaborator = Collaborator::Atmospheric;
    let hourly = response.hourly;
    let len = hourly.time.len();

    let mut lengths = vec![
        ("wind_speed_10m", hourly.wind_speed_10m.len()),
        ("wind_direction_10m", hourly.wind_direction_10m.len()),
    ];
    if let Some(temps) = &hourly.temperature_2m {
        lengths.push(("temperature_2m", temps.len()));
    }
    ensure_lengths(collaborator, len, &lengths)?;

    let usable = complete_prefix(collaborator, len, |i| {
        hourly.wind_speed_10m[i].is_some() && hourly.wind_direction_10m[i].is_some()
    })?;

    let mut samples = Vec::with_capacity(usable);
    for i in 0..usable {
        let (Some(speed), Some(direction)) =
            (hourly.wind_speed_10m[i], hourly.wind_direction_10m[i])
        else {
            continue;
        };
        samples.push(HourlyAtmosphericSample {
            timestamp: parse_local_time(collaborator, &hourly.time[i])?,
            wind_speed_kmh: speed,
            wind_direction_deg: direction,
            temperature_c: hourly
                .temperature_2m
                .as_ref()
                .and_then(|temps| temps.get(i).copied().flatten()),
        });
    }

    let daily = match response.daily {
        Some(daily) => convert_daily(daily)?,
        None if daily_requested => {
            warn!("Daily summary was requested but the weather response has no daily block");
            Vec::new()
        }
        None => Vec::new(),
    };

    Ok(AtmosphericForecast {
        hourly: AtmosphericSeries {
            timezone: response
                .timezone
                .unwrap_or_else(|| fallback_timezone.to_string()),
            samples,
        },
        daily,
    })
}

fn convert_daily(daily: DailyData) -> Result<Vec<DailySummary>> {
    let collaborator = Collaborator::Atmospheric;
    ensure_lengths(
        collaborator,
        daily.time.len(),
        &[
            ("temperature_2m_max", daily.temperature_2m_max.len()),
            ("temperature_2m_min", daily.temperature_2m_min.len()),
            ("sunrise", daily.sunrise.len()),
            ("sunset", daily.sunset.len()),
        ],
    )?;

    let mut days = Vec::with_capacity(daily.time.len());
    for (i, day) in daily.time.iter().enumerate() {
        let (Some(temp_max_c), Some(temp_min_c)) =
            (daily.temperature_2m_max[i], daily.temperature_2m_min[i])
        else {
            debug!("Skipping day {} without temperature range", day);
            continue;
        };
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
            ForecastError::malformed(collaborator, format!("invalid date '{day}': {e}"))
        })?;
        days.push(DailySummary {
            date,
            temp_max_c,
            temp_min_c,
            sunrise: parse_local_time(collaborator, &daily.sunrise[i])?,
            sunset: parse_local_time(collaborator, &daily.sunset[i])?,
        });
    }
    Ok(days)
}

fn ensure_lengths(
    collaborator: Collaborator,
    expected: usize,
    fields: &[(&str, usize)],
) -> Result<()> {
    for (field, len) in fields {
        if *len != expected {
            return Err(ForecastError::malformed(
                collaborator,
                format!("{field} has {len} values for {expected} timestamps"),
            ));
        }
    }
    Ok(())
}

/// Number of leading entries with every required value present. Trailing
/// gaps (a provider's horizon ending early) are dropped; a gap followed by
/// complete data is rejected.
fn complete_prefix(
    collaborator: Collaborator,
    len: usize,
    is_complete: impl Fn(usize) -> bool,
) -> Result<usize> {
    let Some(first_gap) = (0..len).find(|&i| !is_complete(i)) else {
        return Ok(len);
    };
    if let Some(resumed) = (first_gap..len).find(|&i| is_complete(i)) {
        return Err(ForecastError::malformed(
            collaborator,
            format!("missing values at index {first_gap} before data resumes at {resumed}"),
        ));
    }
    debug!(
        "Trimmed {} trailing {} entries without data",
        len - first_gap,
        collaborator
    );
    Ok(first_gap)
}

/// Parse Open-Meteo local timestamps ("2024-03-01T14:00")
fn parse_local_time(collaborator: Collaborator, s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| ForecastError::malformed(collaborator, format!("invalid timestamp '{s}'")))
}
