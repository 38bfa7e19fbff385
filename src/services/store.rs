// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ordered in-memory workout collection with whole-blob persistence.
//!
//! Handles:
//! - Most-recent-first ordering with unique ids
//! - Saving the list and the athlete profile to the key-value slot
//! - Restoring typed workouts from the `kind` discriminator

use crate::db::{keys, KeyValueStore};
use crate::error::{Result, TrackerError};
use crate::models::{AthleteProfile, Workout, WorkoutId};
use std::collections::HashSet;
use std::sync::Arc;

/// Ordered collection of workouts, newest first.
pub struct WorkoutStore {
    workouts: Vec<Workout>,
    backend: Arc<dyn KeyValueStore>,
}

impl WorkoutStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            workouts: Vec::new(),
            backend,
        }
    }

    /// Insert at the front. A colliding id is an internal invariant
    /// violation: it panics in debug builds and errors otherwise.
    pub fn append(&mut self, workout: Workout) -> Result<()> {
        if self.position(workout.id()).is_some() {
            let msg = format!("duplicate workout id {}", workout.id());
            if cfg!(debug_assertions) {
                panic!("{}", msg);
            }
            return Err(TrackerError::Internal(anyhow::anyhow!(msg)));
        }
        self.workouts.insert(0, workout);
        Ok(())
    }

    /// Remove a workout by id, keeping the order of the rest.
    pub fn remove(&mut self, id: &WorkoutId) -> Result<Workout> {
        self.take(id).map(|(_, workout)| workout)
    }

    /// Remove and report the index the workout occupied.
    pub(crate) fn take(&mut self, id: &WorkoutId) -> Result<(usize, Workout)> {
        let index = self
            .position(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        Ok((index, self.workouts.remove(index)))
    }

    /// Put a workout back where [`take`](Self::take) found it.
    pub(crate) fn reinsert(&mut self, index: usize, workout: Workout) {
        let index = index.min(self.workouts.len());
        self.workouts.insert(index, workout);
    }

    /// Read-only view, newest first.
    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn get(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &WorkoutId) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id() == id)
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    fn position(&self, id: &WorkoutId) -> Option<usize> {
        self.workouts.iter().position(|w| w.id() == id)
    }

    // ─── Persistence ─────────────────────────────────────────────

    /// Save the full list and the profile, overwriting both blobs.
    ///
    /// Both blobs are encoded before anything is written, so an encoding
    /// failure leaves storage untouched. The workout list is written last:
    /// when this returns `Err` the saved list is still the previous one.
    pub fn persist(&self, profile: Option<&AthleteProfile>) -> Result<()> {
        let workouts_json = serde_json::to_string(&self.workouts)
            .map_err(|e| TrackerError::Persistence(format!("Failed to encode workouts: {}", e)))?;
        let profile_json = profile.map(AthleteProfile::to_json).transpose()?;

        if let Some(json) = profile_json {
            self.backend.set(keys::PROFILE, &json)?;
        }
        self.backend.set(keys::WORKOUTS, &workouts_json)?;

        tracing::debug!(count = self.workouts.len(), "Persisted workouts");
        Ok(())
    }

    /// Save only the profile blob.
    pub fn save_profile(&self, profile: &AthleteProfile) -> Result<()> {
        self.backend.set(keys::PROFILE, &profile.to_json()?)
    }

    /// Read the saved profile, `None` if there is none yet.
    pub fn load_profile(&self) -> Result<Option<AthleteProfile>> {
        self.backend
            .get(keys::PROFILE)?
            .map(|json| AthleteProfile::from_json(&json))
            .transpose()
    }

    /// Replace in-memory state with the saved list and return the saved
    /// profile.
    ///
    /// Fails with [`TrackerError::NoSavedData`] if nothing was ever saved and
    /// [`TrackerError::Deserialization`] if the blob is corrupt. On failure
    /// the in-memory list is left as it was.
    pub fn restore(&mut self) -> Result<Option<AthleteProfile>> {
        let json = self
            .backend
            .get(keys::WORKOUTS)?
            .ok_or_else(|| TrackerError::NoSavedData(keys::WORKOUTS.to_string()))?;

        let workouts: Vec<Workout> = serde_json::from_str(&json)?;

        let mut seen = HashSet::new();
        for workout in &workouts {
            workout.validate_restored()?;
            if !seen.insert(workout.id().clone()) {
                return Err(TrackerError::Deserialization(format!(
                    "duplicate workout id {}",
                    workout.id()
                )));
            }
        }

        let profile = self.load_profile()?;

        tracing::info!(count = workouts.len(), "Restored workouts");
        self.workouts = workouts;
        Ok(profile)
    }

    /// Swap the whole list, returning the previous one.
    pub(crate) fn replace(&mut self, workouts: Vec<Workout>) -> Vec<Workout> {
        std::mem::replace(&mut self.workouts, workouts)
    }
}
