// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use workout_tracker::config::Config;
use workout_tracker::db::{KeyValueStore, MemoryStore};
use workout_tracker::error::{Result, TrackerError};
use workout_tracker::models::{
    AthleteProfile, Coords, ProfileForm, WeatherSnapshot, Workout, WorkoutId, WorkoutKind,
};
use workout_tracker::services::{
    Collaborators, Coordinator, FormView, ListView, Locator, MapView, MarkerHandle, Notifier,
    WeatherSource,
};

/// Everything the fake UI was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
pub enum UiEvent {
    MapInitialized(Coords, u8),
    MarkerAdded(MarkerHandle, String),
    PopupUpdated(MarkerHandle, String),
    MarkerRemoved(MarkerHandle),
    PannedTo(Coords, u8),
    RowInserted(WorkoutId),
    RowUpdated(WorkoutId),
    ListRendered(Vec<WorkoutId>),
    FormShown,
    FormHidden,
    FieldShown(WorkoutKind),
    PositionRequested,
    Notice(String),
}

/// Records every collaborator call.
#[derive(Default)]
pub struct FakeUi {
    events: Mutex<Vec<UiEvent>>,
    next_marker: AtomicU64,
}

#[allow(dead_code)]
impl FakeUi {
    fn record(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&UiEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    pub fn markers_added(&self) -> Vec<MarkerHandle> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::MarkerAdded(handle, _) => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Notice(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn last_list(&self) -> Option<Vec<WorkoutId>> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::ListRendered(ids) => Some(ids),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl MapView for FakeUi {
    fn initialize(&self, center: Coords, zoom: u8) {
        self.record(UiEvent::MapInitialized(center, zoom));
    }

    fn add_marker(&self, _coords: Coords, popup: &str) -> MarkerHandle {
        let handle = MarkerHandle(self.next_marker.fetch_add(1, Ordering::SeqCst));
        self.record(UiEvent::MarkerAdded(handle, popup.to_string()));
        handle
    }

    fn update_popup(&self, marker: MarkerHandle, popup: &str) {
        self.record(UiEvent::PopupUpdated(marker, popup.to_string()));
    }

    fn remove_marker(&self, marker: MarkerHandle) {
        self.record(UiEvent::MarkerRemoved(marker));
    }

    fn pan_to(&self, coords: Coords, zoom: u8) {
        self.record(UiEvent::PannedTo(coords, zoom));
    }
}

impl ListView for FakeUi {
    fn insert_row(&self, workout: &Workout) {
        self.record(UiEvent::RowInserted(workout.id().clone()));
    }

    fn update_row(&self, workout: &Workout) {
        self.record(UiEvent::RowUpdated(workout.id().clone()));
    }

    fn render_all(&self, workouts: &[Workout]) {
        self.record(UiEvent::ListRendered(
            workouts.iter().map(|w| w.id().clone()).collect(),
        ));
    }
}

impl FormView for FakeUi {
    fn show(&self) {
        self.record(UiEvent::FormShown);
    }

    fn hide(&self) {
        self.record(UiEvent::FormHidden);
    }

    fn show_field_for(&self, kind: WorkoutKind) {
        self.record(UiEvent::FieldShown(kind));
    }
}

impl Locator for FakeUi {
    fn request_position(&self) {
        self.record(UiEvent::PositionRequested);
    }
}

impl Notifier for FakeUi {
    fn notice(&self, message: &str) {
        self.record(UiEvent::Notice(message.to_string()));
    }
}

/// How the fake weather source answers.
#[allow(dead_code)]
pub enum WeatherScript {
    /// Always returns conditions for the requested hour.
    Sunny,
    /// Answers, but has nothing for the requested hour.
    NoData,
    /// Every request fails with a network error.
    Down,
    /// Waits for the gate to open, then behaves like `Sunny`.
    Gated(Arc<Notify>),
}

pub struct FakeWeather {
    script: WeatherScript,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl FakeWeather {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
pub fn sunny_at(at_hour: DateTime<Utc>) -> WeatherSnapshot {
    WeatherSnapshot {
        observed_at: at_hour,
        temperature_c: 18.5,
        humidity_pct: 55.0,
        wind_speed_kmh: 12.0,
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn fetch(
        &self,
        _coords: Coords,
        at_hour: DateTime<Utc>,
    ) -> Result<Option<WeatherSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            WeatherScript::Sunny => Ok(Some(sunny_at(at_hour))),
            WeatherScript::NoData => Ok(None),
            WeatherScript::Down => Err(TrackerError::Network("connection refused".to_string())),
            WeatherScript::Gated(gate) => {
                gate.notified().await;
                Ok(Some(sunny_at(at_hour)))
            }
        }
    }
}

/// Memory store whose writes can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
    fail_key: Arc<Mutex<Option<&'static str>>>,
    writes: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail only writes to `key`; other keys keep working.
    pub fn fail_writes_to(&self, key: &'static str) {
        *self.fail_key.lock().unwrap() = Some(key);
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let key_fails = *self.fail_key.lock().unwrap() == Some(key);
        if self.fail_writes.load(Ordering::SeqCst) || key_fails {
            return Err(TrackerError::Persistence("disk full".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

/// Config with fast weather retries for tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.weather.timeout = Duration::from_secs(1);
    config.weather.max_attempts = 2;
    config.weather.retry_backoff = Duration::from_millis(1);
    config
}

pub struct Harness {
    pub coordinator: Coordinator,
    pub ui: Arc<FakeUi>,
    pub store: FlakyStore,
    pub weather: Arc<FakeWeather>,
}

/// Coordinator wired to fakes and a fresh store.
#[allow(dead_code)]
pub fn harness(script: WeatherScript) -> Harness {
    harness_with_store(script, FlakyStore::default())
}

pub fn fake_weather(script: WeatherScript) -> Arc<FakeWeather> {
    Arc::new(FakeWeather {
        script,
        calls: AtomicU32::new(0),
    })
}

/// Coordinator wired to fakes and an existing store.
pub fn harness_with_store(script: WeatherScript, store: FlakyStore) -> Harness {
    let ui = Arc::new(FakeUi::default());
    let weather = fake_weather(script);
    let views = Collaborators {
        map: ui.clone(),
        list: ui.clone(),
        form: ui.clone(),
        locator: ui.clone(),
        notifier: ui.clone(),
    };
    let coordinator = Coordinator::new(
        test_config(),
        Arc::new(store.clone()),
        weather.clone(),
        views,
    );
    Harness {
        coordinator,
        ui,
        store,
        weather,
    }
}

#[allow(dead_code)]
pub fn profile_form(gender: &str, age: &str, weight: &str, height: &str) -> ProfileForm {
    ProfileForm {
        gender: gender.to_string(),
        age: age.to_string(),
        weight_kg: weight.to_string(),
        height_cm: height.to_string(),
    }
}

#[allow(dead_code)]
pub fn home() -> Coords {
    Coords::new(37.3861, -122.0839).unwrap()
}

/// Create the reference profile (male, 30, 75 kg, 180 cm) and load the map.
#[allow(dead_code)]
pub async fn ready(h: &Harness) -> AthleteProfile {
    let profile = h
        .coordinator
        .create_profile(&profile_form("male", "30", "75", "180"))
        .await
        .expect("profile should be created");
    h.coordinator.position_acquired(home()).await.unwrap();
    h.coordinator.map_loaded().await;
    profile
}

/// Reopen the same storage in a fresh coordinator and load the map.
#[allow(dead_code)]
pub async fn reopen(store: &FlakyStore) -> Harness {
    let h = harness_with_store(WeatherScript::NoData, store.clone());
    h.coordinator.launch().await;
    h.coordinator.position_acquired(home()).await.unwrap();
    h.coordinator.map_loaded().await;
    h
}
