//! Application configuration loaded from environment variables.
//!
//! Everything has a sensible default so a bare checkout runs against the
//! public Open-Meteo endpoint and stores data under `.workout-tracker/`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How a requested hour is matched against an hourly weather series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourMatch {
    /// Only an identical hour key counts.
    Exact,
    /// The closest hour within one hour of the request.
    Nearest,
}

impl FromStr for HourMatch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(HourMatch::Exact),
            "nearest" => Ok(HourMatch::Nearest),
            other => Err(ConfigError::Invalid("WEATHER_HOUR_MATCH", other.to_string())),
        }
    }
}

/// Weather client settings.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Base URL of the Open-Meteo compatible API
    pub base_url: String,
    /// Timeout applied to each attempt
    pub timeout: Duration,
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each following retry
    pub retry_backoff: Duration,
    pub hour_match: HourMatch,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            retry_backoff: Duration::from_millis(500),
            hour_match: HourMatch::Exact,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted `profile` and `workouts` blobs
    pub storage_dir: PathBuf,
    pub weather: WeatherConfig,
    /// Zoom level used when the map is initialized or panned to a workout
    pub map_zoom: u8,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".workout-tracker"),
            weather: WeatherConfig::default(),
            map_zoom: 13,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        let hour_match = match env::var("WEATHER_HOUR_MATCH") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.weather.hour_match,
        };

        Ok(Self {
            storage_dir: env::var("TRACKER_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            weather: WeatherConfig {
                base_url: env::var("WEATHER_BASE_URL")
                    .map(|v| v.trim().trim_end_matches('/').to_string())
                    .unwrap_or(defaults.weather.base_url),
                timeout: Duration::from_secs(parse_or("WEATHER_TIMEOUT_SECS", 10)),
                max_attempts: parse_or("WEATHER_MAX_ATTEMPTS", 2).max(1),
                retry_backoff: Duration::from_millis(parse_or("WEATHER_RETRY_BACKOFF_MS", 500)),
                hour_match,
            },
            map_zoom: parse_or("MAP_ZOOM", defaults.map_zoom),
        })
    }
}

/// Read a numeric env var, falling back to `default` when unset or unparsable.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
