// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Point-in-time weather attached to a workout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conditions observed at the hour a workout was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Hour the observation belongs to
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    /// Relative humidity, 0-100
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
}

impl WeatherSnapshot {
    /// Short line for marker popups, e.g. `14.2°C, 63% humidity, wind 11.5 km/h`.
    pub fn summary(&self) -> String {
        format!(
            "{:.1}°C, {:.0}% humidity, wind {:.1} km/h",
            self.temperature_c, self.humidity_pct, self.wind_speed_kmh
        )
    }
}
