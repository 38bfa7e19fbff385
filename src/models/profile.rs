// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Athlete profile model.

use crate::error::{Result, TrackerError};
use crate::models::ensure_positive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Minutes in a day, used to spread the daily BMR over a workout.
const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(TrackerError::Validation(format!(
                "gender must be male or female, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// The person training. Fields only change through [`AthleteProfile::edit`],
/// which swaps all of them at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    id: String,
    gender: Gender,
    age: f64,
    weight_kg: f64,
    height_cm: f64,
}

impl AthleteProfile {
    /// Create a profile with a fresh id.
    pub fn create(gender: Gender, age: f64, weight_kg: f64, height_cm: f64) -> Result<Self> {
        Self::with_id(
            Uuid::new_v4().simple().to_string(),
            gender,
            age,
            weight_kg,
            height_cm,
        )
    }

    fn with_id(
        id: String,
        gender: Gender,
        age: f64,
        weight_kg: f64,
        height_cm: f64,
    ) -> Result<Self> {
        Ok(Self {
            id,
            gender,
            age: ensure_positive("age", age)?,
            weight_kg: ensure_positive("weight", weight_kg)?,
            height_cm: ensure_positive("height", height_cm)?,
        })
    }

    /// Replace every field, keeping the id. Existing workouts keep the
    /// metrics they were created with.
    pub fn edit(&self, gender: Gender, age: f64, weight_kg: f64, height_cm: f64) -> Result<Self> {
        Self::with_id(self.id.clone(), gender, age, weight_kg, height_cm)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    /// Daily basal metabolic rate (Harris-Benedict) in kcal.
    pub fn daily_bmr(&self) -> f64 {
        let (w, h, a) = (self.weight_kg, self.height_cm, self.age);
        match self.gender {
            Gender::Male => 66.47 + 13.75 * w + 5.003 * h - 6.755 * a,
            Gender::Female => 655.1 + 9.563 * w + 1.85 * h - 4.676 * a,
        }
    }

    /// Calories burned over `duration_min` at the fixed activity factor,
    /// truncated to whole kcal.
    pub fn calories_for(&self, duration_min: f64, activity_factor: f64) -> f64 {
        (self.daily_bmr() / MINUTES_PER_DAY * activity_factor * duration_min).trunc()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a saved profile, re-checking the numeric invariants.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: AthleteProfile = serde_json::from_str(json)?;
        Self::with_id(raw.id, raw.gender, raw.age, raw.weight_kg, raw.height_cm).map_err(|e| {
            TrackerError::Deserialization(format!("saved profile is invalid: {}", e))
        })
    }
}
