// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Raw form input as submitted by the UI, and its parsing.
//!
//! Every field arrives as a string. Parsing is a pure guard: it either
//! yields a fully valid value or a [`TrackerError::Validation`] naming the
//! offending field, and never touches application state.

use crate::error::{Result, TrackerError};
use crate::models::{ensure_positive, AthleteProfile, Coords, Gender, Workout, WorkoutKind};

/// Fields of the athlete profile form.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub gender: String,
    pub age: String,
    pub weight_kg: String,
    pub height_cm: String,
}

impl ProfileForm {
    /// Parse into `(gender, age, weight_kg, height_cm)`.
    pub fn parse(&self) -> Result<(Gender, f64, f64, f64)> {
        Ok((
            self.gender.parse()?,
            parse_positive("age", &self.age)?,
            parse_positive("weight", &self.weight_kg)?,
            parse_positive("height", &self.height_cm)?,
        ))
    }

    pub fn to_profile(&self) -> Result<AthleteProfile> {
        let (gender, age, weight_kg, height_cm) = self.parse()?;
        AthleteProfile::create(gender, age, weight_kg, height_cm)
    }
}

/// Fields of the workout form. Only the field matching `kind` (cadence for
/// running, elevation for cycling) is read.
#[derive(Debug, Clone, Default)]
pub struct WorkoutForm {
    pub kind: String,
    pub distance_km: String,
    pub duration_min: String,
    pub cadence_spm: String,
    pub elevation_gain_m: String,
}

impl WorkoutForm {
    pub fn running(distance_km: &str, duration_min: &str, cadence_spm: &str) -> Self {
        Self {
            kind: "running".to_string(),
            distance_km: distance_km.to_string(),
            duration_min: duration_min.to_string(),
            cadence_spm: cadence_spm.to_string(),
            elevation_gain_m: String::new(),
        }
    }

    pub fn cycling(distance_km: &str, duration_min: &str, elevation_gain_m: &str) -> Self {
        Self {
            kind: "cycling".to_string(),
            distance_km: distance_km.to_string(),
            duration_min: duration_min.to_string(),
            cadence_spm: String::new(),
            elevation_gain_m: elevation_gain_m.to_string(),
        }
    }

    /// Validate the form and build the workout at `coords`.
    pub fn build(&self, coords: Coords, athlete: Option<&AthleteProfile>) -> Result<Workout> {
        let kind: WorkoutKind = self.kind.parse()?;
        let distance = parse_positive("distance", &self.distance_km)?;
        let duration = parse_positive("duration", &self.duration_min)?;

        match kind {
            WorkoutKind::Running => {
                let cadence = parse_positive("cadence", &self.cadence_spm)?;
                Workout::create_running(distance, duration, coords, cadence, athlete)
            }
            WorkoutKind::Cycling => {
                let elevation = parse_positive("elevation gain", &self.elevation_gain_m)?;
                Workout::create_cycling(distance, duration, coords, elevation, athlete)
            }
        }
    }
}

/// Parse a required, finite, strictly positive number.
fn parse_positive(field: &str, raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TrackerError::Validation(format!("{} is required", field)));
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| TrackerError::Validation(format!("{} must be a number, got {:?}", field, raw)))?;
    ensure_positive(field, value)
}
