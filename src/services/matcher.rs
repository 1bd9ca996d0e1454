// SPDX-License-Identifier: MIT

//! Distance matching: select comparable efforts for a target distance.

use crate::models::{Activity, DistancePreset};

/// Filter activities to the preset's tolerance band and order them fastest
/// pace first.
///
/// The sort is stable, so runs at identical pace keep their incoming
/// (fetch) order. Activities with zero distance have no defined pace and
/// never match. Empty input yields an empty vec.
pub fn matching_runs(activities: &[Activity], preset: &DistancePreset) -> Vec<Activity> {
    let mut matched: Vec<Activity> = activities
        .iter()
        .filter(|a| a.pace_sec_per_km().is_some() && preset.contains_km(a.distance_km()))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        // Filter above guarantees a defined pace
        let pa = a.pace_sec_per_km().unwrap_or(f64::INFINITY);
        let pb = b.pace_sec_per_km().unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
    });

    matched
}
