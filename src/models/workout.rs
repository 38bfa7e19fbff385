// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout record model and derived metrics.

use crate::error::{Result, TrackerError};
use crate::models::{ensure_positive, AthleteProfile, WeatherSnapshot};
use crate::time_utils::format_day_month;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Activity factor applied to the per-minute BMR for cycling calories.
pub const CYCLING_ACTIVITY_FACTOR: f64 = 5.5;

/// Opaque workout identifier, stable for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    /// Generate a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkoutId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Map coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    /// Build a coordinate, rejecting values outside the WGS84 range.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let coords = Self { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    fn validate(&self) -> Result<()> {
        if !(self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)) {
            return Err(TrackerError::Validation(format!(
                "latitude out of range: {}",
                self.lat
            )));
        }
        if !(self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng)) {
            return Err(TrackerError::Validation(format!(
                "longitude out of range: {}",
                self.lng
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    /// Capitalized label for descriptions.
    pub fn label(self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Cycling => "Cycling",
        }
    }
}

impl FromStr for WorkoutKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(WorkoutKind::Running),
            "cycling" => Ok(WorkoutKind::Cycling),
            other => Err(TrackerError::Validation(format!(
                "workout type must be running or cycling, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutKind::Running => write!(f, "running"),
            WorkoutKind::Cycling => write!(f, "cycling"),
        }
    }
}

/// Variant-specific inputs and the metrics derived from them.
///
/// Serialized inline with a `kind` discriminator so a restore rebuilds the
/// right variant without recomputing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkoutMetrics {
    Running {
        cadence_spm: f64,
        /// Minutes per kilometre
        pace_min_per_km: f64,
    },
    Cycling {
        elevation_gain_m: f64,
        speed_kmh: f64,
        /// Whole kcal, from the athlete profile active at creation
        calories_kcal: f64,
    },
}

/// One logged training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Utc>,
    distance_km: f64,
    duration_min: f64,
    coords: Coords,
    #[serde(flatten)]
    metrics: WorkoutMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weather: Option<WeatherSnapshot>,
}

impl Workout {
    /// Build a running workout. Pace is `duration / distance`, unrounded.
    pub fn create_running(
        distance_km: f64,
        duration_min: f64,
        coords: Coords,
        cadence_spm: f64,
        athlete: Option<&AthleteProfile>,
    ) -> Result<Self> {
        Self::running_at(
            Utc::now(),
            distance_km,
            duration_min,
            coords,
            cadence_spm,
            athlete,
        )
    }

    /// Build a cycling workout. Speed is km/h and calories come from the
    /// athlete's BMR, both computed once here.
    pub fn create_cycling(
        distance_km: f64,
        duration_min: f64,
        coords: Coords,
        elevation_gain_m: f64,
        athlete: Option<&AthleteProfile>,
    ) -> Result<Self> {
        Self::cycling_at(
            Utc::now(),
            distance_km,
            duration_min,
            coords,
            elevation_gain_m,
            athlete,
        )
    }

    pub(crate) fn running_at(
        created_at: DateTime<Utc>,
        distance_km: f64,
        duration_min: f64,
        coords: Coords,
        cadence_spm: f64,
        athlete: Option<&AthleteProfile>,
    ) -> Result<Self> {
        athlete.ok_or(TrackerError::MissingProfile)?;
        let distance_km = ensure_positive("distance", distance_km)?;
        let duration_min = ensure_positive("duration", duration_min)?;
        let cadence_spm = ensure_positive("cadence", cadence_spm)?;
        coords.validate()?;

        Ok(Self {
            id: WorkoutId::generate(),
            created_at,
            distance_km,
            duration_min,
            coords,
            metrics: WorkoutMetrics::Running {
                cadence_spm,
                pace_min_per_km: duration_min / distance_km,
            },
            weather: None,
        })
    }

    pub(crate) fn cycling_at(
        created_at: DateTime<Utc>,
        distance_km: f64,
        duration_min: f64,
        coords: Coords,
        elevation_gain_m: f64,
        athlete: Option<&AthleteProfile>,
    ) -> Result<Self> {
        let athlete = athlete.ok_or(TrackerError::MissingProfile)?;
        let distance_km = ensure_positive("distance", distance_km)?;
        let duration_min = ensure_positive("duration", duration_min)?;
        let elevation_gain_m = ensure_positive("elevation gain", elevation_gain_m)?;
        coords.validate()?;

        Ok(Self {
            id: WorkoutId::generate(),
            created_at,
            distance_km,
            duration_min,
            coords,
            metrics: WorkoutMetrics::Cycling {
                elevation_gain_m,
                speed_kmh: distance_km / (duration_min / 60.0),
                calories_kcal: athlete.calories_for(duration_min, CYCLING_ACTIVITY_FACTOR),
            },
            weather: None,
        })
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn kind(&self) -> WorkoutKind {
        match self.metrics {
            WorkoutMetrics::Running { .. } => WorkoutKind::Running,
            WorkoutMetrics::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn metrics(&self) -> &WorkoutMetrics {
        &self.metrics
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    /// Attach weather. Returns `false` if the record was already enriched.
    pub(crate) fn attach_weather(&mut self, weather: WeatherSnapshot) -> bool {
        if self.weather.is_some() {
            return false;
        }
        self.weather = Some(weather);
        true
    }

    /// e.g. `Running on April 14`
    pub fn description(&self) -> String {
        format!(
            "{} on {}",
            self.kind().label(),
            format_day_month(self.created_at)
        )
    }

    /// Marker popup text: description, plus weather once it is known.
    pub fn popup_text(&self) -> String {
        match &self.weather {
            Some(weather) => format!("{} · {}", self.description(), weather.summary()),
            None => self.description(),
        }
    }

    /// Check the invariants a saved record must still satisfy.
    pub(crate) fn validate_restored(&self) -> Result<()> {
        let checks = [
            ("distance", self.distance_km),
            ("duration", self.duration_min),
        ];
        for (field, value) in checks {
            ensure_positive(field, value).map_err(|e| {
                TrackerError::Deserialization(format!("workout {}: {}", self.id, e))
            })?;
        }
        self.coords
            .validate()
            .map_err(|e| TrackerError::Deserialization(format!("workout {}: {}", self.id, e)))
    }
}
