// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Truncate a timestamp down to the top of its hour.
pub fn truncate_to_hour(date: DateTime<Utc>) -> DateTime<Utc> {
    date.duration_trunc(TimeDelta::hours(1)).unwrap_or(date)
}

/// Key used by hourly weather series, e.g. `2024-05-01T14:00`.
pub fn hourly_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:00").to_string()
}

/// Parse an hourly series key back into a UTC timestamp.
pub fn parse_hourly_key(key: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(key, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Human date used in workout descriptions, e.g. `April 14`.
pub fn format_day_month(date: DateTime<Utc>) -> String {
    date.format("%B %-d").to_string()
}
