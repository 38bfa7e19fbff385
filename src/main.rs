// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout tracker inspector
//!
//! Prints the saved workouts from the configured storage directory, or with
//! `weather <lat> <lng>` checks the weather lookup for a coordinate at the
//! current hour.
//!
//! Usage:
//! ```bash
//! cargo run --bin workout-tracker
//! cargo run --bin workout-tracker -- weather 37.39 -122.08
//! ```

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker::{
    config::Config,
    db::FileStore,
    models::{Coords, WorkoutMetrics},
    services::{fetch_with_retry, OpenMeteoClient, WorkoutStore},
    time_utils::{format_utc_rfc3339, truncate_to_hour},
};

#[derive(Parser)]
#[command(
    name = "workout-tracker",
    about = "Inspect saved workouts and the weather lookup"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Look up the weather at a coordinate for the current hour
    #[command(allow_negative_numbers = true)]
    Weather {
        /// Latitude in decimal degrees
        lat: f64,
        /// Longitude in decimal degrees
        lng: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging();

    let config = Config::from_env()?;

    match args.command {
        None => show_saved(&config)?,
        Some(Command::Weather { lat, lng }) => {
            show_weather(&config, Coords::new(lat, lng)?).await?;
        }
    }
    Ok(())
}

/// Restore and log every saved workout.
fn show_saved(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = FileStore::open(&config.storage_dir)?;
    tracing::info!(path = %backend.dir().display(), "Reading saved workouts");

    let mut store = WorkoutStore::new(Arc::new(backend));
    let profile = match store.restore() {
        Ok(profile) => profile,
        Err(e) if e.is_first_run() => {
            tracing::info!("Nothing saved yet");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(profile) = &profile {
        tracing::info!(
            gender = %profile.gender(),
            age = profile.age(),
            weight_kg = profile.weight_kg(),
            height_cm = profile.height_cm(),
            "Athlete profile"
        );
    }

    for workout in store.all() {
        let created_at = format_utc_rfc3339(workout.created_at());
        let weather = workout.weather().map(|w| w.summary());
        match workout.metrics() {
            WorkoutMetrics::Running {
                cadence_spm,
                pace_min_per_km,
            } => tracing::info!(
                id = %workout.id(),
                created_at = %created_at,
                distance_km = workout.distance_km(),
                duration_min = workout.duration_min(),
                cadence_spm,
                pace_min_per_km,
                weather = weather.as_deref(),
                "{}",
                workout.description()
            ),
            WorkoutMetrics::Cycling {
                elevation_gain_m,
                speed_kmh,
                calories_kcal,
            } => tracing::info!(
                id = %workout.id(),
                created_at = %created_at,
                distance_km = workout.distance_km(),
                duration_min = workout.duration_min(),
                elevation_gain_m,
                speed_kmh,
                calories_kcal,
                weather = weather.as_deref(),
                "{}",
                workout.description()
            ),
        }
    }
    tracing::info!(count = store.len(), "Done");
    Ok(())
}

/// Look up the weather for `coords` at the current hour.
async fn show_weather(config: &Config, coords: Coords) -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenMeteoClient::new(&config.weather)?;
    let at_hour = truncate_to_hour(chrono::Utc::now());

    match fetch_with_retry(&client, &config.weather, coords, at_hour).await? {
        Some(snapshot) => tracing::info!(
            observed_at = %format_utc_rfc3339(snapshot.observed_at),
            "{}",
            snapshot.summary()
        ),
        None => tracing::warn!(hour = %format_utc_rfc3339(at_hour), "No weather for this hour"),
    }
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("workout_tracker=debug,info")
                }),
        )
        .with(format)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_shows_saved_workouts() {
        let args = Args::try_parse_from(["workout-tracker"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_weather_accepts_negative_coordinates() {
        let args =
            Args::try_parse_from(["workout-tracker", "weather", "-33.86", "-151.2"]).unwrap();
        match args.command {
            Some(Command::Weather { lat, lng }) => {
                assert_eq!(lat, -33.86);
                assert_eq!(lng, -151.2);
            }
            None => panic!("expected weather subcommand"),
        }
    }

    #[test]
    fn test_weather_rejects_non_numeric_coordinates() {
        assert!(Args::try_parse_from(["workout-tracker", "weather", "north", "1.0"]).is_err());
    }
}
