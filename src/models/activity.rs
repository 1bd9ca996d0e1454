// SPDX-License-Identifier: MIT

//! Stored run activity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Sport type processed by the sync and analysis pipeline.
pub const SPORT_RUN: &str = "Run";

/// Stored activity record, one document per Strava activity.
///
/// Lives in the owning athlete's partition; the Strava activity ID is the
/// document ID, so writes are upserts by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    /// Strava activity ID (also used as document ID)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub strava_activity_id: u64,
    /// Strava athlete ID (partition owner)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub athlete_id: u64,
    /// Activity name/title
    pub name: String,
    /// Sport type (Run, Ride, Hike, ...)
    pub sport_type: String,
    /// Distance in meters
    pub distance_meters: f64,
    /// Moving time in seconds
    pub moving_time_seconds: u32,
    /// Average heart rate in bpm, absent when recorded without a monitor
    pub average_heartrate: Option<f64>,
    /// Activity start time
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_date: DateTime<Utc>,
    /// First time this activity was stored (never overwritten)
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    /// Last time this activity was written
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Distance in kilometers.
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// Pace in seconds per kilometer. Derived, never stored.
    ///
    /// Undefined (`None`) for zero-distance activities.
    pub fn pace_sec_per_km(&self) -> Option<f64> {
        let km = self.distance_km();
        if km > 0.0 {
            Some(f64::from(self.moving_time_seconds) / km)
        } else {
            None
        }
    }

    /// Whether this activity is a run.
    pub fn is_run(&self) -> bool {
        self.sport_type == SPORT_RUN
    }
}
