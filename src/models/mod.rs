// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod form;
pub mod profile;
pub mod weather;
pub mod workout;

pub use form::{ProfileForm, WorkoutForm};
pub use profile::{AthleteProfile, Gender};
pub use weather::WeatherSnapshot;
pub use workout::{Coords, Workout, WorkoutId, WorkoutKind, WorkoutMetrics};

use crate::error::{Result, TrackerError};

/// Reject non-finite and non-positive measurements.
pub(crate) fn ensure_positive(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TrackerError::Validation(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}
