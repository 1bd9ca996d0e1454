//! Performance summary derived from a matched activity set.
//!
//! All fields are recomputed on demand from stored raw fields; nothing in
//! this module is ever persisted, so summaries cannot go stale.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Activity;

/// Minimum matched runs before a pace trend is reported.
const TREND_MIN_RUNS: usize = 6;
/// Number of runs averaged at each end of the trend window.
const TREND_WINDOW: usize = 3;

/// Aggregate statistics over one tolerance band of runs.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PerformanceSummary {
    /// Number of runs in the matched set
    pub total_runs: usize,
    /// Mean pace over the full set (sec/km)
    pub avg_pace_sec_per_km: f64,
    /// Mean heart rate over runs that recorded one; absent if none did
    pub avg_heart_rate: Option<f64>,
    /// Moving time of the fastest-pace run in the set (seconds).
    /// Ranked by pace, not raw time; the two can diverge when distances
    /// inside the band differ.
    pub best_time_seconds: u32,
    /// Percent pace change from the 3 earliest to the 3 most recent runs.
    /// Positive means the athlete got faster. Absent below 6 runs.
    pub pace_improvement_percent: Option<f64>,
}

/// Summarize a pace-ordered matched set. Returns `None` for an empty set.
pub fn summarize(matched: &[Activity]) -> Option<PerformanceSummary> {
    let first = matched.first()?;

    let paces: Vec<f64> = matched
        .iter()
        .filter_map(Activity::pace_sec_per_km)
        .collect();
    let avg_pace_sec_per_km = mean(&paces)?;

    let heart_rates: Vec<f64> = matched.iter().filter_map(|a| a.average_heartrate).collect();
    let avg_heart_rate = mean(&heart_rates);

    Some(PerformanceSummary {
        total_runs: matched.len(),
        avg_pace_sec_per_km,
        avg_heart_rate,
        best_time_seconds: first.moving_time_seconds,
        pace_improvement_percent: pace_improvement(matched),
    })
}

/// Pace trend over the matched set, recovered in chronological order.
///
/// The matcher hands us a pace-ordered view, so the chronological view is
/// rebuilt here by start date. Requires at least 6 runs; below that the
/// trend is absent, not zero.
fn pace_improvement(matched: &[Activity]) -> Option<f64> {
    if matched.len() < TREND_MIN_RUNS {
        return None;
    }

    let mut by_date: Vec<&Activity> = matched.iter().collect();
    by_date.sort_by_key(|a| a.start_date);

    let earliest: Vec<f64> = by_date
        .iter()
        .take(TREND_WINDOW)
        .filter_map(|a| a.pace_sec_per_km())
        .collect();
    let recent: Vec<f64> = by_date
        .iter()
        .rev()
        .take(TREND_WINDOW)
        .filter_map(|a| a.pace_sec_per_km())
        .collect();

    let early_avg = mean(&earliest)?;
    let recent_avg = mean(&recent)?;
    if early_avg <= 0.0 {
        return None;
    }

    Some((early_avg - recent_avg) / early_avg * 100.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
