// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod coordinator;
pub mod store;
pub mod views;
pub mod weather;

pub use coordinator::{Coordinator, EnrichmentOutcome, Phase, StorageMode, WorkoutSubmission};
pub use store::WorkoutStore;
pub use views::{
    Collaborators, FormView, ListView, Locator, LogNotifier, MapView, MarkerHandle,
    MarkerRegistry, Notifier,
};
pub use weather::{fetch_with_retry, HourlySeries, OpenMeteoClient, WeatherSource};
