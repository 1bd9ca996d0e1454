// SPDX-License-Identifier: MIT

//! API routes for authenticated athletes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{summary, Activity, DistancePreset, PerformanceSummary};
use crate::services::matcher::matching_runs;
use crate::services::sync::{DataOrigin, SyncReport};
use crate::services::Session;
use crate::AppState;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/activities", get(get_activities))
        .route("/api/sync", post(force_sync))
        .route("/api/compare", get(compare))
        .route("/api/presets", get(get_presets))
}

/// Fetch the in-memory session for an authenticated request.
///
/// A valid JWT without a live session means the session was torn down
/// (logout or revoked credential); the athlete must re-authorize.
fn require_session(state: &AppState, user: &AuthUser) -> Result<Session> {
    state
        .sessions
        .get(user.athlete_id)
        .ok_or(AppError::InvalidSession)
}

/// Map a sync failure, tearing the session down if the credential is dead.
fn handle_sync_error(state: &AppState, athlete_id: u64, err: AppError) -> AppError {
    if err.is_credential_failure() {
        tracing::warn!(athlete_id, "Strava credential rejected, tearing session down");
        state.sessions.remove(athlete_id);
    }
    err
}

// ─── Athlete Profile ─────────────────────────────────────────

/// Current athlete response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub athlete_id: u64,
    pub athlete_name: String,
}

/// Get the current athlete's identity.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let session = require_session(&state, &user)?;
    Ok(Json(MeResponse {
        athlete_id: session.athlete_id,
        athlete_name: session.athlete_name,
    }))
}

// ─── Activities ──────────────────────────────────────────────

/// Activity set response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub count: usize,
    pub origin: DataOrigin,
    pub activities: Vec<Activity>,
}

/// Get the athlete's run set: from the store when the partition is warm,
/// via a live pagination pass otherwise.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActivitiesResponse>> {
    let session = require_session(&state, &user)?;

    let (activities, origin) = state
        .sync
        .load_or_sync(&session)
        .await
        .map_err(|e| handle_sync_error(&state, user.athlete_id, e))?;

    Ok(Json(ActivitiesResponse {
        count: activities.len(),
        origin,
        activities,
    }))
}

/// Forced re-sync response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncResponse {
    pub report: SyncReport,
    pub count: usize,
}

/// Re-run the full pagination pass regardless of what the store holds.
/// Upserts refresh any fields Strava changed since the last sync.
async fn force_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SyncResponse>> {
    let session = require_session(&state, &user)?;

    let (runs, report) = state
        .sync
        .sync_all(&session)
        .await
        .map_err(|e| handle_sync_error(&state, user.athlete_id, e))?;

    Ok(Json(SyncResponse {
        report,
        count: runs.len(),
    }))
}

// ─── Comparison ──────────────────────────────────────────────

/// Comparison query: a fixed preset label or a custom distance.
#[derive(Deserialize, Validate)]
pub struct CompareQuery {
    /// Fixed preset label ("5K", "10K", "Half Marathon", "Marathon")
    preset: Option<String>,
    /// Custom target distance in kilometers; must be positive
    #[validate(range(exclusive_min = 0.0, message = "distance must be positive"))]
    distance_km: Option<f64>,
}

/// One matched run with its derived pace.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MatchedRun {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub strava_activity_id: u64,
    pub name: String,
    pub distance_km: f64,
    pub moving_time_seconds: u32,
    pub pace_sec_per_km: f64,
    pub average_heartrate: Option<f64>,
    pub start_date: String,
}

impl From<&Activity> for MatchedRun {
    fn from(a: &Activity) -> Self {
        MatchedRun {
            strava_activity_id: a.strava_activity_id,
            name: a.name.clone(),
            distance_km: a.distance_km(),
            moving_time_seconds: a.moving_time_seconds,
            // matcher output always has a defined pace
            pace_sec_per_km: a.pace_sec_per_km().unwrap_or_default(),
            average_heartrate: a.average_heartrate,
            start_date: a.start_date.to_rfc3339(),
        }
    }
}

/// Comparison response: matched runs fastest-first plus the summary.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompareResponse {
    pub preset: DistancePreset,
    pub matches: Vec<MatchedRun>,
    pub summary: Option<PerformanceSummary>,
}

/// Compare efforts over a distance band.
///
/// No matches is a valid "no results" state, not an error: `matches` is
/// empty and `summary` is null.
async fn compare(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<CompareResponse>> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let preset = resolve_preset(&params)?;
    let session = require_session(&state, &user)?;

    let (activities, _origin) = state
        .sync
        .load_or_sync(&session)
        .await
        .map_err(|e| handle_sync_error(&state, user.athlete_id, e))?;

    let matched = matching_runs(&activities, &preset);
    let summary = summary::summarize(&matched);

    Ok(Json(CompareResponse {
        preset,
        matches: matched.iter().map(MatchedRun::from).collect(),
        summary,
    }))
}

/// Resolve the query into a preset; validation happens here, before the
/// matcher ever sees the request.
fn resolve_preset(params: &CompareQuery) -> Result<DistancePreset> {
    if let Some(label) = params.preset.as_deref() {
        return DistancePreset::by_label(label)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown preset: {}", label)));
    }
    if let Some(distance_km) = params.distance_km {
        return Ok(DistancePreset::custom(distance_km));
    }
    Err(AppError::BadRequest(
        "Either 'preset' or 'distance_km' is required".to_string(),
    ))
}

// ─── Presets ─────────────────────────────────────────────────

/// List the fixed presets the UI can offer.
async fn get_presets() -> Json<Vec<DistancePreset>> {
    Json(DistancePreset::fixed())
}
