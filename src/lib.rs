// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout tracker: log running and cycling sessions on a map
//!
//! This crate provides the state and persistence engine behind the tracker:
//! athlete profile, workout records and their derived metrics, the ordered
//! workout store, weather enrichment, and the coordinator that drives the
//! map, list and form collaborators.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
