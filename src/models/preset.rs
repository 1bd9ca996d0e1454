// SPDX-License-Identifier: MIT

//! Distance presets for grouping comparable efforts.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Minimum tolerance for custom distances (km).
const MIN_CUSTOM_TOLERANCE_KM: f64 = 0.5;

/// A target distance with an inclusive tolerance band.
///
/// Activities within `[target - tolerance, target + tolerance]` km count as
/// comparable efforts for this preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DistancePreset {
    pub label: String,
    pub target_km: f64,
    pub tolerance_km: f64,
}

impl DistancePreset {
    /// Fixed presets offered by the UI.
    pub fn fixed() -> Vec<DistancePreset> {
        vec![
            Self::new("5K", 5.0, 0.5),
            Self::new("10K", 10.0, 1.0),
            Self::new("Half Marathon", 21.1, 1.5),
            Self::new("Marathon", 42.2, 2.0),
        ]
    }

    /// Look up a fixed preset by its label (case-insensitive).
    pub fn by_label(label: &str) -> Option<DistancePreset> {
        Self::fixed()
            .into_iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
    }

    /// Build a preset for a user-entered distance.
    ///
    /// The caller must have validated `target_km > 0` already; tolerance is
    /// 10% of the target, floored at 0.5 km.
    pub fn custom(target_km: f64) -> DistancePreset {
        let tolerance = (target_km * 0.1).max(MIN_CUSTOM_TOLERANCE_KM);
        Self::new(format!("{:.1} km", target_km), target_km, tolerance)
    }

    fn new(label: impl Into<String>, target_km: f64, tolerance_km: f64) -> DistancePreset {
        DistancePreset {
            label: label.into(),
            target_km,
            tolerance_km,
        }
    }

    /// Whether a distance (km) falls inside the tolerance band (inclusive).
    pub fn contains_km(&self, distance_km: f64) -> bool {
        distance_km >= self.target_km - self.tolerance_km
            && distance_km <= self.target_km + self.tolerance_km
    }
}
