// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contracts for the UI collaborators the coordinator drives.
//!
//! Rendering, geolocation and DOM wiring live outside this crate. The
//! coordinator only calls these traits, and the UI calls back into the
//! coordinator with events (position acquired, map loaded, click, submit).

use crate::models::{Coords, Workout, WorkoutId, WorkoutKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque handle for a marker drawn by the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Map rendering.
pub trait MapView: Send + Sync {
    fn initialize(&self, center: Coords, zoom: u8);
    fn add_marker(&self, coords: Coords, popup: &str) -> MarkerHandle;
    fn update_popup(&self, marker: MarkerHandle, popup: &str);
    fn remove_marker(&self, marker: MarkerHandle);
    fn pan_to(&self, coords: Coords, zoom: u8);
}

/// The workout list beside the map.
pub trait ListView: Send + Sync {
    /// Show a newly created workout at the top of the list.
    fn insert_row(&self, workout: &Workout);
    /// Redraw one row, e.g. after weather arrives.
    fn update_row(&self, workout: &Workout);
    /// Replace the whole list, newest first.
    fn render_all(&self, workouts: &[Workout]);
}

/// The workout entry form.
pub trait FormView: Send + Sync {
    fn show(&self);
    /// Clear the inputs and hide the form.
    fn hide(&self);
    /// Swap the cadence/elevation input for the chosen kind.
    fn show_field_for(&self, kind: WorkoutKind);
}

/// Geolocation. Answers arrive later through
/// `Coordinator::position_acquired` or `Coordinator::position_failed`.
pub trait Locator: Send + Sync {
    fn request_position(&self);
}

/// Non-blocking user notices (storage trouble, location denied, ...).
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notice(&self, message: &str) {
        tracing::warn!(notice = message, "User notice");
    }
}

/// The set of collaborators handed to the coordinator.
#[derive(Clone)]
pub struct Collaborators {
    pub map: Arc<dyn MapView>,
    pub list: Arc<dyn ListView>,
    pub form: Arc<dyn FormView>,
    pub locator: Arc<dyn Locator>,
    pub notifier: Arc<dyn Notifier>,
}

/// Workout id → marker lookup. Markers never live inside workout records,
/// so a deleted or serialized workout cannot carry a stale handle.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    markers: HashMap<WorkoutId, MarkerHandle>,
}

impl MarkerRegistry {
    pub fn insert(&mut self, id: WorkoutId, marker: MarkerHandle) -> Option<MarkerHandle> {
        self.markers.insert(id, marker)
    }

    pub fn get(&self, id: &WorkoutId) -> Option<MarkerHandle> {
        self.markers.get(id).copied()
    }

    pub fn release(&mut self, id: &WorkoutId) -> Option<MarkerHandle> {
        self.markers.remove(id)
    }

    /// Remove every entry, returning the handles to release.
    pub fn drain(&mut self) -> Vec<MarkerHandle> {
        self.markers.drain().map(|(_, marker)| marker).collect()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_release_and_drain() {
        let mut registry = MarkerRegistry::default();
        let a = WorkoutId::from("a");
        let b = WorkoutId::from("b");
        registry.insert(a.clone(), MarkerHandle(1));
        registry.insert(b.clone(), MarkerHandle(2));

        assert_eq!(registry.release(&a), Some(MarkerHandle(1)));
        assert_eq!(registry.release(&a), None);
        assert_eq!(registry.get(&b), Some(MarkerHandle(2)));

        assert_eq!(registry.drain(), vec![MarkerHandle(2)]);
        assert!(registry.is_empty());
    }
}
