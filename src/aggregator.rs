//! Forecast aggregation
//!
//! Resolves a place name, fetches the marine and atmospheric series
//! concurrently and merges them into annotated hourly rows. The aggregator
//! holds no state between lookups.

use crate::compass::degrees_to_compass_arrow;
use crate::config::SwellcastConfig;
use crate::error::{Collaborator, ForecastError, UpstreamFailure};
use crate::http::JsonFetcher;
use crate::models::{
    AtmosphericForecast, AtmosphericSeries, ForecastReport, Location, MarineSeries,
    MergedForecastRow, is_same_hour,
};
use crate::openmeteo::OpenMeteoClient;
use crate::severity::WindSeverity;
use crate::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// How strictly the two hourly series must line up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Length differences up to this many samples are truncated with a
    /// warning; larger ones fail with `PartialData`
    pub max_length_skew: usize,
    /// Fail with `PartialData` when timestamps differ at the same position
    pub verify_timestamps: bool,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            max_length_skew: 48,
            verify_timestamps: true,
        }
    }
}

/// Runs place lookups against the Open-Meteo collaborators
#[derive(Debug, Clone)]
pub struct ForecastAggregator<F> {
    client: OpenMeteoClient<F>,
    timezone: Tz,
    timeout: Duration,
    geocoding_limit: u32,
    policy: MergePolicy,
}

impl<F: JsonFetcher> ForecastAggregator<F> {
    /// Create an aggregator; fails if the configured timezone is unknown
    pub fn new(fetcher: F, config: SwellcastConfig) -> Result<Self> {
        let timezone = config.forecast.tz()?;
        let timeout = config.request.timeout();
        let geocoding_limit = config.request.geocoding_limit.max(1);
        let policy = config.forecast.merge_policy();

        Ok(Self {
            client: OpenMeteoClient::new(fetcher, config),
            timezone,
            timeout,
            geocoding_limit,
            policy,
        })
    }

    /// Override the per-call upstream timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve a free-text place name to the first geocoding match
    #[instrument(skip(self))]
    pub async fn resolve_location(&self, query: &str) -> Result<Location> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ForecastError::invalid_input("Location cannot be empty"));
        }

        debug!("Geocoding location name: {}", query);
        let candidates = bounded(
            Collaborator::Geocoding,
            self.timeout,
            self.client.geocode(query, self.geocoding_limit),
        )
        .await?;

        // First result is the geocoder's best guess
        let location = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::not_found(query))?;

        debug!(
            "Found location: {} ({})",
            location.name,
            location.format_coordinates()
        );
        Ok(location)
    }

    /// Fetch marine and atmospheric forecasts concurrently; the first
    /// failure wins and the other request is dropped
    #[instrument(skip(self, location), fields(location = %location.name))]
    pub async fn fetch_forecast(
        &self,
        location: &Location,
    ) -> Result<(MarineSeries, AtmosphericForecast)> {
        let start_time = Instant::now();

        let marine = bounded(Collaborator::Marine, self.timeout, self.client.marine(location));
        let atmospheric = bounded(
            Collaborator::Atmospheric,
            self.timeout,
            self.client.atmospheric(location),
        );
        let (marine, atmospheric) = tokio::try_join!(marine, atmospheric)?;

        info!(
            "Fetched forecasts for {} in {:.3}s",
            location.name,
            start_time.elapsed().as_secs_f64()
        );
        Ok((marine, atmospheric))
    }

    /// Full lookup: resolve, fetch, merge. `now` decides the current-hour row.
    #[instrument(skip(self, now))]
    pub async fn lookup(&self, place: &str, now: DateTime<Utc>) -> Result<ForecastReport> {
        info!("Looking up forecast for '{}'", place.trim());

        let location = self.resolve_location(place).await?;
        let (marine, atmospheric) = self.fetch_forecast(&location).await?;

        let timezone = marine.timezone.parse::<Tz>().unwrap_or(self.timezone);
        let local_now = now.with_timezone(&timezone).naive_local();

        let rows = merge_and_annotate(&marine, &atmospheric.hourly, local_now, &self.policy)?;

        Ok(ForecastReport {
            location,
            timezone: timezone.name().to_string(),
            rows,
            daily: atmospheric.daily,
        })
    }
}

async fn bounded<T>(
    collaborator: Collaborator,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, call).await.unwrap_or_else(|_| {
        warn!("{} request timed out after {:.1}s", collaborator, timeout.as_secs_f64());
        Err(ForecastError::upstream(
            collaborator,
            UpstreamFailure::Timeout(timeout),
        ))
    })
}

/// Zip the two hourly series by position and add presentation fields.
///
/// `now` must be in the same local time as the series timestamps.
pub fn merge_and_annotate(
    marine: &MarineSeries,
    atmospheric: &AtmosphericSeries,
    now: NaiveDateTime,
    policy: &MergePolicy,
) -> Result<Vec<MergedForecastRow>> {
    let marine_len = marine.samples.len();
    let atmospheric_len = atmospheric.samples.len();
    let skew = marine_len.abs_diff(atmospheric_len);

    if marine_len == 0 && atmospheric_len > 0 {
        warn!(
            "Marine series is empty against {} weather hours",
            atmospheric_len
        );
        return Err(ForecastError::NoMarineData);
    }
    if skew > policy.max_length_skew {
        return Err(ForecastError::partial_data(format!(
            "marine series has {marine_len} hours but weather series has {atmospheric_len} \
             (tolerance {})",
            policy.max_length_skew
        )));
    }
    if skew > 0 {
        warn!(
            "Series lengths differ ({} marine, {} weather); dropping {} unmatched hours",
            marine_len, atmospheric_len, skew
        );
    }

    if policy.verify_timestamps
        && !marine.timezone.is_empty()
        && !atmospheric.timezone.is_empty()
        && marine.timezone != atmospheric.timezone
    {
        return Err(ForecastError::partial_data(format!(
            "marine series is in {} but weather series is in {}",
            marine.timezone, atmospheric.timezone
        )));
    }

    marine
        .samples
        .iter()
        .zip(&atmospheric.samples)
        .enumerate()
        .map(|(index, (wave, air))| {
            if policy.verify_timestamps && wave.timestamp != air.timestamp {
                return Err(ForecastError::partial_data(format!(
                    "hour {index} is {} in the marine series but {} in the weather series",
                    wave.timestamp, air.timestamp
                )));
            }

            Ok(MergedForecastRow {
                timestamp: wave.timestamp,
                wave_height_m: wave.wave_height_m,
                wave_period_s: wave.wave_period_s,
                wave_direction: degrees_to_compass_arrow(wave.wave_direction_deg),
                wind_speed_kmh: air.wind_speed_kmh,
                wind_severity: WindSeverity::from_speed(air.wind_speed_kmh),
                wind_direction: degrees_to_compass_arrow(air.wind_direction_deg),
                temperature_c: air.temperature_c,
                is_current_hour: is_same_hour(wave.timestamp, now),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HourlyAtmosphericSample, HourlyMarineSample};
    use crate::test_support::{RecordingFetcher, hourly_times};
    use chrono::{NaiveDate, TimeDelta, TimeZone};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn marine_series(hours: usize) -> MarineSeries {
        MarineSeries {
            timezone: "Australia/Sydney".into(),
            samples: (0..hours)
                .map(|i| HourlyMarineSample {
                    timestamp: start() + TimeDelta::hours(i as i64),
                    wave_height_m: 1.0 + i as f64 / 10.0,
                    wave_period_s: 8.0,
                    wave_direction_deg: 135.0,
                })
                .collect(),
        }
    }

    fn atmospheric_series(hours: usize) -> AtmosphericSeries {
        AtmosphericSeries {
            timezone: "Australia/Sydney".into(),
            samples: (0..hours)
                .map(|i| HourlyAtmosphericSample {
                    timestamp: start() + TimeDelta::hours(i as i64),
                    wind_speed_kmh: 5.0 * i as f64,
                    wind_direction_deg: 270.0,
                    temperature_c: Some(20.0),
                })
                .collect(),
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        start().date().and_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_equal_lengths_produce_one_row_per_hour() {
        let marine = marine_series(24);
        let rows = merge_and_annotate(
            &marine,
            &atmospheric_series(24),
            at(3, 0),
            &MergePolicy::default(),
        )
        .unwrap();

        assert_eq!(rows.len(), 24);
        for (row, sample) in rows.iter().zip(&marine.samples) {
            assert_eq!(row.timestamp, sample.timestamp);
        }
        assert_eq!(rows[1].wind_severity, WindSeverity::Low);
        assert_eq!(rows[2].wind_severity, WindSeverity::Moderate);
        assert_eq!(rows[4].wind_severity, WindSeverity::High);
        assert_eq!(rows[0].wave_direction.compass_label, "SE");
        assert_eq!(rows[0].wind_direction.arrow_glyph, "→");
    }

    #[test]
    fn test_mismatched_lengths_truncate_within_tolerance() {
        let rows = merge_and_annotate(
            &marine_series(48),
            &atmospheric_series(24),
            at(0, 0),
            &MergePolicy::default(),
        )
        .unwrap();
        assert_eq!(rows.len(), 24);
    }

    #[test]
    fn test_mismatched_lengths_beyond_tolerance_fail() {
        let policy = MergePolicy {
            max_length_skew: 12,
            ..MergePolicy::default()
        };
        let err = merge_and_annotate(&marine_series(48), &atmospheric_series(24), at(0, 0), &policy)
            .unwrap_err();
        assert!(matches!(err, ForecastError::PartialData { .. }));
    }

    #[rstest]
    #[case(24)]
    #[case(168)]
    fn test_empty_marine_series_is_reported_regardless_of_horizon(#[case] hours: usize) {
        let err = merge_and_annotate(
            &marine_series(0),
            &atmospheric_series(hours),
            at(0, 0),
            &MergePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::NoMarineData));
    }

    #[test]
    fn test_both_series_empty_gives_no_rows() {
        let rows = merge_and_annotate(
            &marine_series(0),
            &atmospheric_series(0),
            at(0, 0),
            &MergePolicy::default(),
        )
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_timestamp_mismatch_is_partial_data() {
        let mut atmospheric = atmospheric_series(3);
        atmospheric.samples[2].timestamp += TimeDelta::hours(1);

        let err = merge_and_annotate(
            &marine_series(3),
            &atmospheric,
            at(0, 0),
            &MergePolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("hour 2"));

        let lenient = MergePolicy {
            verify_timestamps: false,
            ..MergePolicy::default()
        };
        let rows = merge_and_annotate(&marine_series(3), &atmospheric, at(0, 0), &lenient).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_timezone_mismatch_is_partial_data() {
        let mut atmospheric = atmospheric_series(2);
        atmospheric.timezone = "GMT".into();
        let err = merge_and_annotate(
            &marine_series(2),
            &atmospheric,
            at(0, 0),
            &MergePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::PartialData { .. }));
    }

    #[test]
    fn test_current_hour_flag() {
        let mut marine = marine_series(1);
        let mut atmospheric = atmospheric_series(1);
        marine.samples[0].timestamp = at(14, 7);
        atmospheric.samples[0].timestamp = at(14, 7);
        let policy = MergePolicy::default();

        let rows = merge_and_annotate(&marine, &atmospheric, at(14, 45), &policy).unwrap();
        assert!(rows[0].is_current_hour);

        let rows = merge_and_annotate(&marine, &atmospheric, at(15, 0), &policy).unwrap();
        assert!(!rows[0].is_current_hour);
    }

    #[test]
    fn test_merge_is_restartable() {
        let marine = marine_series(6);
        let atmospheric = atmospheric_series(6);
        let policy = MergePolicy::default();
        let first = merge_and_annotate(&marine, &atmospheric, at(2, 0), &policy).unwrap();
        let second = merge_and_annotate(&marine, &atmospheric, at(2, 0), &policy).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.iter().filter(|r| r.is_current_hour).count(), 1);
    }

    fn sydney_fetcher() -> RecordingFetcher {
        RecordingFetcher::default()
            .with_response(
                "search",
                json!({"results": [{
                    "name": "Sydney", "latitude": -33.86785, "longitude": 151.20732,
                    "country": "Australia", "admin1": "New South Wales"
                }]}),
            )
            .with_response(
                "marine",
                json!({
                    "timezone": "Australia/Sydney",
                    "hourly": {
                        "time": hourly_times("2024-03-01", 2),
                        "wave_height": [1.4, 1.6],
                        "wave_direction": [0.0, 180.0],
                        "wave_period": [10.0, 11.0]
                    }
                }),
            )
            .with_response(
                "forecast",
                json!({
                    "timezone": "Australia/Sydney",
                    "hourly": {
                        "time": hourly_times("2024-03-01", 2),
                        "wind_speed_10m": [9.9, 20.0],
                        "wind_direction_10m": [90.0, 315.0]
                    }
                }),
            )
    }

    fn aggregator(fetcher: RecordingFetcher) -> ForecastAggregator<RecordingFetcher> {
        ForecastAggregator::new(fetcher, SwellcastConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_network() {
        let fetcher = sydney_fetcher();
        let agg = aggregator(fetcher.clone());

        for query in ["", "   \t"] {
            let err = agg.resolve_location(query).await.unwrap_err();
            assert!(matches!(err, ForecastError::InvalidInput { .. }));
        }
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_place_is_not_found() {
        let fetcher = RecordingFetcher::default().with_response("search", json!({"results": []}));
        let err = aggregator(fetcher.clone())
            .resolve_location("zzzznotaplace")
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::NotFound { ref query } if query == "zzzznotaplace"));
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_uses_first_candidate_and_trims() {
        let fetcher = RecordingFetcher::default().with_response(
            "search",
            json!({"results": [
                {"name": "Newcastle", "latitude": -32.93, "longitude": 151.78},
                {"name": "Newcastle upon Tyne", "latitude": 54.97, "longitude": -1.61}
            ]}),
        );
        let location = aggregator(fetcher.clone())
            .resolve_location("  Newcastle ")
            .await
            .unwrap();
        assert_eq!(location.name, "Newcastle");
        assert!(fetcher.requests()[0].contains("name=Newcastle&"));
    }

    #[tokio::test]
    async fn test_lookup_end_to_end() {
        let now = chrono_tz::Australia::Sydney
            .with_ymd_and_hms(2024, 3, 1, 1, 30, 0)
            .unwrap()
            .with_timezone(&Utc);

        let report = aggregator(sydney_fetcher()).lookup("Sydney", now).await.unwrap();

        assert!((report.location.latitude + 33.87).abs() < 0.01);
        assert!((report.location.longitude - 151.21).abs() < 0.01);
        assert_eq!(report.timezone, "Australia/Sydney");
        assert_eq!(report.rows.len(), 2);

        assert_eq!(report.rows[0].wind_severity, WindSeverity::Low);
        assert_eq!(report.rows[1].wind_severity, WindSeverity::High);
        assert_eq!(report.rows[0].wave_direction.compass_label, "N");
        assert_eq!(report.rows[1].wave_direction.arrow_glyph, "↑");
        assert_eq!(report.rows[0].wind_direction.compass_label, "E");
        assert_eq!(report.rows[1].wind_direction.compass_label, "NW");
        assert!(!report.rows[0].is_current_hour);
        assert!(report.rows[1].is_current_hour);
        assert!(report.daily.is_empty());
    }

    fn inland_fetcher(hours: usize) -> RecordingFetcher {
        let nulls = vec![Value::Null; hours];
        RecordingFetcher::default()
            .with_response(
                "search",
                json!({"results": [{
                    "name": "Canberra", "latitude": -35.28, "longitude": 149.13,
                    "country": "Australia", "admin1": "Australian Capital Territory"
                }]}),
            )
            .with_response(
                "marine",
                json!({
                    "timezone": "Australia/Sydney",
                    "hourly": {
                        "time": hourly_times("2024-03-01", hours),
                        "wave_height": nulls.clone(),
                        "wave_direction": nulls.clone(),
                        "wave_period": nulls
                    }
                }),
            )
            .with_response(
                "forecast",
                json!({
                    "timezone": "Australia/Sydney",
                    "hourly": {
                        "time": hourly_times("2024-03-01", hours),
                        "wind_speed_10m": vec![12.0; hours],
                        "wind_direction_10m": vec![250.0; hours]
                    }
                }),
            )
    }

    #[rstest]
    #[case(24)]
    #[case(168)]
    #[tokio::test]
    async fn test_inland_place_without_waves(#[case] hours: usize) {
        let err = aggregator(inland_fetcher(hours))
            .lookup("Canberra", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::NoMarineData));
        assert!(err.user_message().contains("No wave forecast"));
    }

    #[tokio::test]
    async fn test_marine_failure_fails_fast() {
        let fetcher = RecordingFetcher::default()
            .with_failure("marine", UpstreamFailure::Status(500))
            .with_response("forecast", json!({}))
            .delayed(Duration::from_secs(30));
        let agg = aggregator(fetcher).with_timeout(Duration::from_secs(60));
        let location = Location::new(-33.87, 151.21, "Sydney".into());

        let started = Instant::now();
        let err = agg.fetch_forecast(&location).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            err,
            ForecastError::Upstream {
                collaborator: Collaborator::Marine,
                reason: UpstreamFailure::Status(500),
            }
        ));
    }

    #[tokio::test]
    async fn test_hung_upstream_times_out() {
        let fetcher = RecordingFetcher::default()
            .with_response("marine", json!({}))
            .delayed(Duration::from_secs(30))
            .with_response("forecast", json!({}))
            .delayed(Duration::from_secs(30));
        let agg = aggregator(fetcher).with_timeout(Duration::from_millis(50));
        let location = Location::new(-33.87, 151.21, "Sydney".into());

        let err = agg.fetch_forecast(&location).await.unwrap_err();
        assert!(matches!(
            err,
            ForecastError::Upstream {
                reason: UpstreamFailure::Timeout(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut config = SwellcastConfig::default();
        config.forecast.timezone = "Nowhere/Special".into();
        assert!(ForecastAggregator::new(RecordingFetcher::default(), config).is_err());
    }
}
