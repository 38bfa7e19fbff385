// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather enrichment: the source contract, an Open-Meteo client, and the
//! timeout/retry runner the coordinator uses.
//!
//! Handles:
//! - Fetching hourly series (temperature, humidity, wind) for a coordinate
//! - Matching the requested hour against the series
//! - Per-attempt timeout and bounded retry with doubling backoff

use crate::config::{HourMatch, WeatherConfig};
use crate::error::{Result, TrackerError};
use crate::models::{Coords, WeatherSnapshot};
use crate::time_utils::{hourly_key, parse_hourly_key};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

/// Anything that can report the weather at a coordinate for a given hour.
///
/// `Ok(None)` means the source answered but has no data for that hour;
/// the workout then simply keeps no weather.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, coords: Coords, at_hour: DateTime<Utc>)
        -> Result<Option<WeatherSnapshot>>;
}

/// Client for the Open-Meteo forecast API.
#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
    hour_match: HourMatch,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed building weather HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            hour_match: config.hour_match,
        })
    }

    /// Fetch the raw hourly series around `coords`.
    pub async fn hourly_series(&self, coords: Coords) -> Result<HourlySeries> {
        let url = format!("{}/v1/forecast", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coords.lat.to_string()),
                ("longitude", coords.lng.to_string()),
                (
                    "hourly",
                    "temperature_2m,relativehumidity_2m,windspeed_10m".to_string(),
                ),
                ("timezone", "GMT".to_string()),
                ("past_days", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                tracing::warn!("Weather API rate limit hit (429)");
            }
            return Err(TrackerError::Network(format!("HTTP {}: {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;
        parse_forecast(&body)
    }
}

/// Decode a forecast body. A malformed payload is `Deserialization`, which
/// is not retried.
fn parse_forecast(body: &str) -> Result<HourlySeries> {
    let forecast: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| TrackerError::Deserialization(format!("weather response: {}", e)))?;
    Ok(forecast.hourly)
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch(
        &self,
        coords: Coords,
        at_hour: DateTime<Utc>,
    ) -> Result<Option<WeatherSnapshot>> {
        let series = self.hourly_series(coords).await?;
        let snapshot = series.lookup(at_hour, self.hour_match);
        if snapshot.is_none() {
            tracing::debug!(hour = %hourly_key(at_hour), "No weather for requested hour");
        }
        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

/// Parallel hourly arrays as returned by Open-Meteo, indexed by `time`.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(alias = "relative_humidity_2m")]
    pub relativehumidity_2m: Vec<Option<f64>>,
    #[serde(alias = "wind_speed_10m")]
    pub windspeed_10m: Vec<Option<f64>>,
}

impl HourlySeries {
    /// Find the entry for `at_hour` under the given matching policy.
    pub fn lookup(&self, at_hour: DateTime<Utc>, policy: HourMatch) -> Option<WeatherSnapshot> {
        let index = match policy {
            HourMatch::Exact => {
                let key = hourly_key(at_hour);
                self.time.iter().position(|t| *t == key)?
            }
            HourMatch::Nearest => self.nearest_index(at_hour)?,
        };
        self.snapshot_at(index)
    }

    /// Closest hour within one hour of `at`.
    fn nearest_index(&self, at: DateTime<Utc>) -> Option<usize> {
        self.time
            .iter()
            .enumerate()
            .filter_map(|(i, t)| parse_hourly_key(t).map(|ts| (i, (ts - at).abs())))
            .filter(|(_, skew)| *skew <= TimeDelta::hours(1))
            .min_by_key(|(_, skew)| *skew)
            .map(|(i, _)| i)
    }

    fn snapshot_at(&self, index: usize) -> Option<WeatherSnapshot> {
        let observed_at = parse_hourly_key(self.time.get(index)?)?;
        Some(WeatherSnapshot {
            observed_at,
            temperature_c: (*self.temperature_2m.get(index)?)?,
            humidity_pct: (*self.relativehumidity_2m.get(index)?)?,
            wind_speed_kmh: (*self.windspeed_10m.get(index)?)?,
        })
    }
}

/// Run `source.fetch` with a per-attempt timeout, retrying network failures
/// up to `config.max_attempts` in total.
pub async fn fetch_with_retry(
    source: &dyn WeatherSource,
    config: &WeatherConfig,
    coords: Coords,
    at_hour: DateTime<Utc>,
) -> Result<Option<WeatherSnapshot>> {
    let mut backoff = config.retry_backoff;
    let mut attempt = 1;

    loop {
        let result = match tokio::time::timeout(config.timeout, source.fetch(coords, at_hour)).await
        {
            Ok(result) => result,
            Err(_) => Err(TrackerError::Network(format!(
                "timed out after {} ms",
                config.timeout.as_millis()
            ))),
        };

        match result {
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::warn!(attempt, error = %e, "Weather request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn series() -> HourlySeries {
        serde_json::from_str(
            r#"{
                "time": ["2024-05-01T13:00", "2024-05-01T14:00", "2024-05-01T15:00"],
                "temperature_2m": [14.1, 15.3, null],
                "relative_humidity_2m": [70, 65, 60],
                "wind_speed_10m": [8.2, 9.0, 10.4]
            }"#,
        )
        .unwrap()
    }

    fn hour(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let snapshot = series().lookup(hour(14, 0), HourMatch::Exact).unwrap();
        assert_eq!(snapshot.observed_at, hour(14, 0));
        assert_eq!(snapshot.temperature_c, 15.3);
        assert_eq!(snapshot.humidity_pct, 65.0);
        assert_eq!(snapshot.wind_speed_kmh, 9.0);
    }

    #[test]
    fn test_exact_match_misses_unlisted_hour() {
        assert!(series().lookup(hour(18, 0), HourMatch::Exact).is_none());
    }

    #[test]
    fn test_null_value_means_unavailable() {
        assert!(series().lookup(hour(15, 0), HourMatch::Exact).is_none());
    }

    #[test]
    fn test_nearest_absorbs_small_skew() {
        let snapshot = series().lookup(hour(13, 20), HourMatch::Nearest).unwrap();
        assert_eq!(snapshot.observed_at, hour(13, 0));
        assert!(series().lookup(hour(18, 0), HourMatch::Nearest).is_none());
    }

    #[test]
    fn test_parses_forecast_response_with_legacy_names() {
        let body = r#"{
            "latitude": 52.5,
            "hourly": {
                "time": ["2024-05-01T14:00"],
                "temperature_2m": [15.3],
                "relativehumidity_2m": [65],
                "windspeed_10m": [9.0]
            }
        }"#;
        let hourly = parse_forecast(body).unwrap();
        assert!(hourly.lookup(hour(14, 0), HourMatch::Exact).is_some());
    }

    #[test]
    fn test_malformed_forecast_is_not_retryable() {
        let err = parse_forecast(r#"{"error": true, "reason": "bad latitude"}"#).unwrap_err();
        assert!(matches!(err, TrackerError::Deserialization(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_client_builds_from_config() {
        assert!(OpenMeteoClient::new(&WeatherConfig::default()).is_ok());
    }

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl WeatherSource for Flaky {
        async fn fetch(&self, _: Coords, at: DateTime<Utc>) -> Result<Option<WeatherSnapshot>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(TrackerError::Network("connection reset".to_string()));
            }
            Ok(Some(WeatherSnapshot {
                observed_at: at,
                temperature_c: 10.0,
                humidity_pct: 50.0,
                wind_speed_kmh: 5.0,
            }))
        }
    }

    fn quick_config(max_attempts: u32) -> WeatherConfig {
        WeatherConfig {
            timeout: Duration::from_millis(200),
            max_attempts,
            retry_backoff: Duration::from_millis(1),
            ..WeatherConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let source = Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
        };
        let coords = Coords::new(1.0, 2.0).unwrap();
        let result = fetch_with_retry(&source, &quick_config(2), coords, hour(14, 0)).await;
        assert!(result.unwrap().is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let source = Flaky {
            failures: 5,
            calls: AtomicU32::new(0),
        };
        let coords = Coords::new(1.0, 2.0).unwrap();
        let result = fetch_with_retry(&source, &quick_config(3), coords, hour(14, 0)).await;
        assert!(matches!(result, Err(TrackerError::Network(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    struct Hangs;

    #[async_trait]
    impl WeatherSource for Hangs {
        async fn fetch(&self, _: Coords, _: DateTime<Utc>) -> Result<Option<WeatherSnapshot>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_hanging_source_times_out() {
        let config = WeatherConfig {
            timeout: Duration::from_millis(20),
            ..quick_config(1)
        };
        let coords = Coords::new(1.0, 2.0).unwrap();
        let result = fetch_with_retry(&Hangs, &config, coords, hour(14, 0)).await;
        match result {
            Err(TrackerError::Network(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
