// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use pacelog::config::Config;
use pacelog::db::{FirestoreStore, MemoryStore};
use pacelog::error::AppError;
use pacelog::middleware::auth::create_jwt;
use pacelog::routes::create_router;
use pacelog::services::strava::StravaActivitySummary;
use pacelog::services::sync::ActivitySource;
use pacelog::services::{Session, SessionStore, StravaClient, Synchronizer};
use pacelog::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Scripted activity source serving pre-built pages.
pub struct FakeSource {
    pages: Vec<Vec<StravaActivitySummary>>,
    calls: AtomicUsize,
}

impl FakeSource {
    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    async fn fetch_page(
        &self,
        _access_token: &str,
        page: u32,
        _per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .pages
            .get((page - 1) as usize)
            .cloned()
            .unwrap_or_default())
    }
}

/// Build an activity summary for scripted pages.
#[allow(dead_code)]
pub fn summary(
    id: u64,
    sport: &str,
    distance_km: f64,
    moving_time_seconds: u32,
    day: u32,
) -> StravaActivitySummary {
    StravaActivitySummary {
        id,
        name: format!("Activity {}", id),
        sport_type: sport.to_string(),
        start_date: format!("2024-03-{:02}T08:00:00Z", day),
        distance: distance_km * 1000.0,
        moving_time: moving_time_seconds,
        average_heartrate: None,
    }
}

/// Create a test app backed by an in-memory store and a scripted source.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(
    pages: Vec<Vec<StravaActivitySummary>>,
) -> (axum::Router, Arc<AppState>, Arc<FakeSource>) {
    let config = Config::test_default();
    let source = Arc::new(FakeSource {
        pages,
        calls: AtomicUsize::new(0),
    });
    let store = Arc::new(MemoryStore::new());

    let strava = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );
    let sync = Synchronizer::new(source.clone(), store);

    let state = Arc::new(AppState {
        config,
        strava,
        sessions: SessionStore::new(),
        sync,
    });

    (create_router(state.clone()), state, source)
}

/// Source that rejects every fetch as unauthorized, as Strava does once
/// an athlete revokes access.
pub struct RevokedSource;

#[async_trait]
impl ActivitySource for RevokedSource {
    async fn fetch_page(
        &self,
        _access_token: &str,
        _page: u32,
        _per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        Err(AppError::StravaUnauthorized)
    }
}

/// Create a test app whose source rejects the credential on every call.
#[allow(dead_code)]
pub fn create_revoked_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = Arc::new(MemoryStore::new());

    let strava = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );
    let sync = Synchronizer::new(Arc::new(RevokedSource), store);

    let state = Arc::new(AppState {
        config,
        strava,
        sessions: SessionStore::new(),
        sync,
    });

    (create_router(state.clone()), state)
}

/// Create a signed session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(athlete_id: u64, signing_key: &[u8]) -> String {
    create_jwt(athlete_id, signing_key).expect("JWT creation should succeed")
}

/// Seed a live session so protected handlers find a credential.
#[allow(dead_code)]
pub fn seed_session(state: &AppState, athlete_id: u64) {
    state.sessions.insert(Session::new(
        athlete_id,
        "Test Athlete".to_string(),
        "test_access_token".to_string(),
    ));
}
