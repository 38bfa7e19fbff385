// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracker error taxonomy.

/// Error type shared by the store, the weather client and the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Bad or missing form input. The form stays open and nothing is mutated.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A workout was submitted while no athlete profile is active.
    #[error("No athlete profile is active")]
    MissingProfile,

    #[error("Workout not found: {0}")]
    NotFound(String),

    /// The persistence slot holds nothing under the requested key.
    #[error("Nothing saved under key: {0}")]
    NoSavedData(String),

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Saved data is corrupt: {0}")]
    Deserialization(String),

    #[error("Weather request failed: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TrackerError {
    /// True when restore found an empty slot, which is a normal first run.
    pub fn is_first_run(&self) -> bool {
        matches!(self, TrackerError::NoSavedData(_))
    }

    /// True for failures worth another weather request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::Network(_))
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Deserialization(err.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Persistence(err.to_string())
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, TrackerError>;
