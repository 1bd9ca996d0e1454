// SPDX-License-Identifier: MIT

//! Pacelog: sync Strava runs and compare performances over distance bands.
//!
//! This crate provides the backend API that pulls an athlete's running
//! history from Strava, keeps it in a per-athlete store, and derives
//! distance-banded comparisons and pace trends from it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{SessionStore, StravaClient, Synchronizer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub strava: StravaClient,
    pub sessions: SessionStore,
    pub sync: Synchronizer,
}
