// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinator: the tracker's state machine.
//!
//! Handles the core workflow:
//! 1. Create or load the athlete profile, then ask for the user's position
//! 2. Initialize the map and restore saved workouts once it has loaded
//! 3. Open the form on a map click, build and save the workout on submit
//! 4. Enrich the saved workout with weather in the background
//! 5. Delete, select and reset workouts
//!
//! Workouts are appended and saved before weather is requested, so creating
//! a workout never waits on the network. Weather arrives later, is applied
//! at most once, and triggers a second save.

use crate::config::Config;
use crate::db::KeyValueStore;
use crate::error::{Result, TrackerError};
use crate::models::{
    AthleteProfile, Coords, ProfileForm, WeatherSnapshot, Workout, WorkoutForm, WorkoutId,
    WorkoutKind,
};
use crate::services::views::{Collaborators, MarkerRegistry};
use crate::services::weather::{fetch_with_retry, WeatherSource};
use crate::services::WorkoutStore;
use crate::time_utils::truncate_to_hour;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Where the UI currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// No athlete profile yet; only the profile form is usable.
    NoProfile,
    /// Profile active, waiting for the position and the map.
    MapUnloaded,
    /// Map loaded, waiting for a click.
    AwaitingClick,
    /// Workout form open for the clicked coordinate.
    FormOpen(Coords),
}

/// Whether changes are written to the persistence slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Durable,
    /// Saved data could not be read; writes are skipped so the saved blob is
    /// not overwritten.
    MemoryOnly,
}

/// How a weather enrichment settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Weather was attached and saved.
    Applied,
    /// The source had no data for the requested hour.
    Unavailable,
    /// The request failed after all retries.
    Failed,
    /// The workout was deleted before the weather arrived.
    Discarded,
    /// The workout already had weather.
    AlreadyEnriched,
}

/// A workout that was created and saved, plus its pending enrichment.
#[derive(Debug)]
pub struct WorkoutSubmission {
    pub workout: Workout,
    pub enrichment: JoinHandle<EnrichmentOutcome>,
}

struct State {
    phase: Phase,
    profile: Option<AthleteProfile>,
    store: WorkoutStore,
    markers: MarkerRegistry,
    storage: StorageMode,
}

struct Shared {
    state: Mutex<State>,
    weather: Arc<dyn WeatherSource>,
    views: Collaborators,
    config: Config,
}

/// Orchestrates profile, workouts, persistence, weather and the UI.
///
/// Cheap to clone; clones share the same state. Every operation holds the
/// state lock for its whole duration, which also serializes saves and
/// restores against background enrichment.
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    pub fn new(
        config: Config,
        backend: Arc<dyn KeyValueStore>,
        weather: Arc<dyn WeatherSource>,
        views: Collaborators,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    phase: Phase::NoProfile,
                    profile: None,
                    store: WorkoutStore::new(backend),
                    markers: MarkerRegistry::default(),
                    storage: StorageMode::Durable,
                }),
                weather,
                views,
                config,
            }),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub async fn phase(&self) -> Phase {
        self.shared.state.lock().await.phase
    }

    pub async fn profile(&self) -> Option<AthleteProfile> {
        self.shared.state.lock().await.profile.clone()
    }

    /// Snapshot of all workouts, newest first.
    pub async fn workouts(&self) -> Vec<Workout> {
        self.shared.state.lock().await.store.all().to_vec()
    }

    pub async fn workout(&self, id: &WorkoutId) -> Option<Workout> {
        self.shared.state.lock().await.store.get(id).cloned()
    }

    pub async fn storage_mode(&self) -> StorageMode {
        self.shared.state.lock().await.storage
    }

    // ─── Profile ─────────────────────────────────────────────────

    /// Load a saved profile, if any, and continue to the map.
    pub async fn launch(&self) {
        let mut state = self.shared.state.lock().await;
        if state.phase != Phase::NoProfile {
            return;
        }

        match state.store.load_profile() {
            Ok(Some(profile)) => {
                tracing::info!(profile_id = profile.id(), "Loaded saved profile");
                state.profile = Some(profile);
                state.phase = Phase::MapUnloaded;
                self.shared.views.locator.request_position();
            }
            Ok(None) => tracing::info!("No saved profile, waiting for profile form"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load saved profile");
                state.storage = StorageMode::MemoryOnly;
                self.notice(&format!("Saved data could not be loaded: {}", e));
            }
        }
    }

    /// Create the athlete profile from the profile form.
    pub async fn create_profile(&self, form: &ProfileForm) -> Result<AthleteProfile> {
        let mut state = self.shared.state.lock().await;
        if state.phase != Phase::NoProfile {
            return Err(TrackerError::Validation(
                "a profile already exists, edit it instead".to_string(),
            ));
        }

        let profile = form.to_profile()?;
        self.save_profile(&state, &profile)?;

        tracing::info!(profile_id = profile.id(), "Profile created");
        state.profile = Some(profile.clone());
        state.phase = Phase::MapUnloaded;
        self.shared.views.locator.request_position();
        Ok(profile)
    }

    /// Replace every profile field. Existing workouts keep their metrics.
    pub async fn edit_profile(&self, form: &ProfileForm) -> Result<AthleteProfile> {
        let mut state = self.shared.state.lock().await;
        let current = state.profile.as_ref().ok_or(TrackerError::MissingProfile)?;

        let (gender, age, weight_kg, height_cm) = form.parse()?;
        let edited = current.edit(gender, age, weight_kg, height_cm)?;
        self.save_profile(&state, &edited)?;

        tracing::info!(profile_id = edited.id(), "Profile edited");
        state.profile = Some(edited.clone());
        Ok(edited)
    }

    // ─── Map ─────────────────────────────────────────────────────

    /// The locator found the user; draw the map there.
    pub async fn position_acquired(&self, position: Coords) -> Result<()> {
        let position = Coords::new(position.lat, position.lng)?;
        let state = self.shared.state.lock().await;
        if state.phase != Phase::MapUnloaded {
            tracing::debug!(phase = ?state.phase, "Ignoring position outside map setup");
            return Ok(());
        }
        self.shared
            .views
            .map
            .initialize(position, self.shared.config.map_zoom);
        Ok(())
    }

    pub fn position_failed(&self, reason: &str) {
        tracing::warn!(reason, "Could not get position");
        self.notice(&format!("Could not get your position: {}", reason));
    }

    /// The map finished loading: restore saved workouts and draw them.
    pub async fn map_loaded(&self) {
        let mut state = self.shared.state.lock().await;
        if state.phase != Phase::MapUnloaded {
            tracing::debug!(phase = ?state.phase, "Ignoring map load outside map setup");
            return;
        }

        if state.storage == StorageMode::Durable {
            match state.store.restore() {
                Ok(saved_profile) => {
                    if state.profile.is_none() {
                        state.profile = saved_profile;
                    }
                }
                Err(e) if e.is_first_run() => tracing::info!("No saved workouts, first run"),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to restore workouts");
                    state.storage = StorageMode::MemoryOnly;
                    self.notice(&format!(
                        "Saved workouts could not be loaded, changes will not be saved: {}",
                        e
                    ));
                }
            }
        }

        let state = &mut *state;
        for workout in state.store.all() {
            let marker = self
                .shared
                .views
                .map
                .add_marker(workout.coords(), &workout.popup_text());
            state.markers.insert(workout.id().clone(), marker);
        }
        self.shared.views.list.render_all(state.store.all());
        state.phase = Phase::AwaitingClick;
    }

    /// A map click opens the form for that coordinate. Clicking again while
    /// the form is open moves the coordinate.
    pub async fn map_clicked(&self, at: Coords) -> Result<()> {
        let at = Coords::new(at.lat, at.lng)?;
        let mut state = self.shared.state.lock().await;
        match state.phase {
            Phase::AwaitingClick | Phase::FormOpen(_) => {
                state.phase = Phase::FormOpen(at);
                self.shared.views.form.show();
                Ok(())
            }
            Phase::NoProfile | Phase::MapUnloaded => Err(TrackerError::Validation(
                "the map is not ready yet".to_string(),
            )),
        }
    }

    /// Pan the map to a workout picked from the list.
    pub async fn select_workout(&self, id: &WorkoutId) -> Result<()> {
        let state = self.shared.state.lock().await;
        let workout = state
            .store
            .get(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        self.shared
            .views
            .map
            .pan_to(workout.coords(), self.shared.config.map_zoom);
        Ok(())
    }

    // ─── Form ────────────────────────────────────────────────────

    pub fn workout_kind_changed(&self, kind: WorkoutKind) {
        self.shared.views.form.show_field_for(kind);
    }

    /// Close the form without touching the workouts.
    pub async fn cancel_form(&self) {
        let mut state = self.shared.state.lock().await;
        if let Phase::FormOpen(_) = state.phase {
            state.phase = Phase::AwaitingClick;
            self.shared.views.form.hide();
        }
    }

    /// Validate the form, then append, save and draw the workout and start
    /// its weather enrichment.
    ///
    /// Validation failures change nothing. A failed save removes the workout
    /// again, so a workout is either appended and saved or neither.
    pub async fn submit_workout(&self, form: &WorkoutForm) -> Result<WorkoutSubmission> {
        let mut state = self.shared.state.lock().await;

        let profile = state.profile.as_ref().ok_or(TrackerError::MissingProfile)?;
        let Phase::FormOpen(coords) = state.phase else {
            return Err(TrackerError::Validation(
                "click the map to choose a location first".to_string(),
            ));
        };
        let workout = form.build(coords, Some(profile))?;

        state.store.append(workout.clone())?;
        if let Err(e) = self.save_all(&state) {
            state.store.remove(workout.id())?;
            return Err(e);
        }

        let marker = self
            .shared
            .views
            .map
            .add_marker(coords, &workout.popup_text());
        state.markers.insert(workout.id().clone(), marker);
        self.shared.views.list.insert_row(&workout);
        self.shared.views.form.hide();
        state.phase = Phase::AwaitingClick;
        drop(state);

        tracing::info!(
            workout_id = %workout.id(),
            kind = %workout.kind(),
            "Workout created"
        );

        let enrichment = self.spawn_enrichment(
            workout.id().clone(),
            coords,
            truncate_to_hour(workout.created_at()),
        );
        Ok(WorkoutSubmission {
            workout,
            enrichment,
        })
    }

    // ─── Deletion ────────────────────────────────────────────────

    /// Delete a workout and release its marker. Unknown ids change nothing.
    pub async fn delete_workout(&self, id: &WorkoutId) -> Result<Workout> {
        let mut state = self.shared.state.lock().await;

        let (index, workout) = state.store.take(id).inspect_err(|_| {
            tracing::debug!(workout_id = %id, "Delete of unknown workout ignored");
        })?;
        if let Err(e) = self.save_all(&state) {
            state.store.reinsert(index, workout);
            return Err(e);
        }

        if let Some(marker) = state.markers.release(id) {
            self.shared.views.map.remove_marker(marker);
        }
        self.shared.views.list.render_all(state.store.all());

        tracing::info!(workout_id = %id, kind = %workout.kind(), "Workout deleted");
        Ok(workout)
    }

    /// Delete every workout. The profile is kept.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;

        let previous = state.store.replace(Vec::new());
        if let Err(e) = self.save_all(&state) {
            state.store.replace(previous);
            return Err(e);
        }

        for marker in state.markers.drain() {
            self.shared.views.map.remove_marker(marker);
        }
        self.shared.views.list.render_all(&[]);
        tracing::info!(count = previous.len(), "Workouts reset");
        Ok(())
    }

    // ─── Weather ─────────────────────────────────────────────────

    fn spawn_enrichment(
        &self,
        id: WorkoutId,
        coords: Coords,
        at_hour: DateTime<Utc>,
    ) -> JoinHandle<EnrichmentOutcome> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let result = fetch_with_retry(
                coordinator.shared.weather.as_ref(),
                &coordinator.shared.config.weather,
                coords,
                at_hour,
            )
            .await;

            match result {
                Ok(Some(snapshot)) => coordinator.apply_weather(&id, snapshot).await,
                Ok(None) => {
                    tracing::debug!(workout_id = %id, "No weather for workout hour");
                    EnrichmentOutcome::Unavailable
                }
                Err(e) => {
                    tracing::warn!(workout_id = %id, error = %e, "Weather enrichment failed");
                    EnrichmentOutcome::Failed
                }
            }
        })
    }

    /// Attach a weather result to a stored workout, save, and refresh its
    /// marker popup and list row. A workout is enriched at most once.
    pub async fn apply_weather(
        &self,
        id: &WorkoutId,
        weather: WeatherSnapshot,
    ) -> EnrichmentOutcome {
        let mut state = self.shared.state.lock().await;

        let Some(workout) = state.store.get_mut(id) else {
            tracing::debug!(workout_id = %id, "Workout gone before weather arrived");
            return EnrichmentOutcome::Discarded;
        };
        if !workout.attach_weather(weather) {
            tracing::debug!(workout_id = %id, "Workout already has weather");
            return EnrichmentOutcome::AlreadyEnriched;
        }
        let workout = workout.clone();

        if let Err(e) = self.save_all(&state) {
            tracing::warn!(workout_id = %id, error = %e, "Weather kept in memory only");
        }
        if let Some(marker) = state.markers.get(id) {
            self.shared
                .views
                .map
                .update_popup(marker, &workout.popup_text());
        }
        self.shared.views.list.update_row(&workout);

        tracing::info!(workout_id = %id, "Workout enriched with weather");
        EnrichmentOutcome::Applied
    }

    // ─── Storage helpers ─────────────────────────────────────────

    fn save_all(&self, state: &State) -> Result<()> {
        if state.storage == StorageMode::MemoryOnly {
            tracing::debug!("Memory-only mode, skipping save");
            return Ok(());
        }
        state.store.persist(state.profile.as_ref()).inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to save workouts");
            self.notice(&format!("Your workouts could not be saved: {}", e));
        })
    }

    fn save_profile(&self, state: &State, profile: &AthleteProfile) -> Result<()> {
        if state.storage == StorageMode::MemoryOnly {
            return Ok(());
        }
        state.store.save_profile(profile).inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to save profile");
            self.notice(&format!("Your profile could not be saved: {}", e));
        })
    }

    fn notice(&self, message: &str) {
        self.shared.views.notifier.notice(message);
    }
}
