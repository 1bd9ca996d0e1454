// SPDX-License-Identifier: MIT

//! End-to-end sync and comparison tests over the HTTP API, with an
//! in-memory store and a scripted activity source.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::summary;

async fn get_json(app: &axum::Router, token: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_first_load_is_live_then_cached() {
    let page = vec![
        summary(1, "Run", 10.0, 3000, 1),
        summary(2, "Ride", 40.0, 5000, 2),
        summary(3, "Run", 5.0, 1500, 3),
    ];
    let (app, state, source) = common::create_test_app(vec![page]);
    let token = common::create_test_jwt(7, &state.config.jwt_signing_key);
    common::seed_session(&state, 7);

    let (status, body) = get_json(&app, &token, "/api/activities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "live");
    // Rides are filtered out before storage
    assert_eq!(body["count"], 2);
    let live_fetches = source.call_count();
    assert!(live_fetches >= 1);

    let (status, body) = get_json(&app, &token, "/api/activities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "cache");
    assert_eq!(body["count"], 2);
    // Cached load issued no further source traffic
    assert_eq!(source.call_count(), live_fetches);
}

#[tokio::test]
async fn test_compare_orders_matches_by_pace() {
    let page = vec![
        summary(1, "Run", 10.0, 3000, 1),
        summary(2, "Run", 10.0, 2900, 2),
        summary(3, "Run", 21.1, 6600, 3), // outside the 10K band
    ];
    let (app, state, _source) = common::create_test_app(vec![page]);
    let token = common::create_test_jwt(7, &state.config.jwt_signing_key);
    common::seed_session(&state, 7);

    let (status, body) = get_json(&app, &token, "/api/compare?preset=10K").await;
    assert_eq!(status, StatusCode::OK);

    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["strava_activity_id"], 2);
    assert_eq!(matches[1]["strava_activity_id"], 1);

    let summary = &body["summary"];
    assert_eq!(summary["total_runs"], 2);
    assert_eq!(summary["best_time_seconds"], 2900);
    // Two runs is below the trend threshold
    assert!(summary["pace_improvement_percent"].is_null());
}

#[tokio::test]
async fn test_compare_trend_over_six_runs() {
    // Three early runs at 300 sec/km, three later ones at 270 sec/km.
    let page = vec![
        summary(1, "Run", 10.0, 3000, 1),
        summary(2, "Run", 10.0, 3000, 2),
        summary(3, "Run", 10.0, 3000, 3),
        summary(4, "Run", 10.0, 2700, 20),
        summary(5, "Run", 10.0, 2700, 21),
        summary(6, "Run", 10.0, 2700, 22),
    ];
    let (app, state, _source) = common::create_test_app(vec![page]);
    let token = common::create_test_jwt(7, &state.config.jwt_signing_key);
    common::seed_session(&state, 7);

    let (status, body) = get_json(&app, &token, "/api/compare?preset=10K").await;
    assert_eq!(status, StatusCode::OK);

    let improvement = body["summary"]["pace_improvement_percent"].as_f64().unwrap();
    assert!((improvement - 10.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_compare_no_matches_is_empty_not_error() {
    let page = vec![summary(1, "Run", 5.0, 1500, 1)];
    let (app, state, _source) = common::create_test_app(vec![page]);
    let token = common::create_test_jwt(7, &state.config.jwt_signing_key);
    common::seed_session(&state, 7);

    let (status, body) = get_json(&app, &token, "/api/compare?preset=Marathon").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"].as_array().unwrap().len(), 0);
    assert!(body["summary"].is_null());
}

#[tokio::test]
async fn test_force_sync_reports_totals() {
    let page = vec![
        summary(1, "Run", 10.0, 3000, 1),
        summary(2, "Hike", 8.0, 7200, 2),
    ];
    let (app, state, _source) = common::create_test_app(vec![page]);
    let token = common::create_test_jwt(7, &state.config.jwt_signing_key);
    common::seed_session(&state, 7);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sync")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["report"]["pages"], 1);
    assert_eq!(body["report"]["fetched"], 2);
    assert_eq!(body["report"]["runs"], 1);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_presets_listing() {
    let (app, state, _source) = common::create_test_app(vec![]);
    let token = common::create_test_jwt(7, &state.config.jwt_signing_key);
    common::seed_session(&state, 7);

    let (status, body) = get_json(&app, &token, "/api/presets").await;
    assert_eq!(status, StatusCode::OK);

    let presets = body.as_array().unwrap();
    assert_eq!(presets.len(), 4);
    assert_eq!(presets[0]["label"], "5K");
}
