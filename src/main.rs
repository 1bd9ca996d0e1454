// SPDX-License-Identifier: MIT

//! Pacelog API Server
//!
//! Connects an athlete's Strava account, syncs their running history into
//! a per-athlete Firestore partition, and serves distance-banded
//! performance comparisons.

use pacelog::{
    config::Config,
    db::FirestoreStore,
    services::{SessionStore, StravaClient, Synchronizer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Pacelog API");

    // Initialize Firestore-backed activity store
    let store = FirestoreStore::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");
    let store = Arc::new(store);

    // Strava client doubles as the paginated activity source
    let strava = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );

    let sync = Synchronizer::new(Arc::new(strava.clone()), store);
    let sessions = SessionStore::new();

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        strava,
        sessions,
        sync,
    });

    // Build router
    let app = pacelog::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pacelog=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
