// SPDX-License-Identifier: MIT

//! OAuth flow surface tests (no live Strava calls).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_auth_start_redirects_to_strava() {
    let (app, _state, _source) = common::create_test_app(vec![]);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/strava")
                .header(header::HOST, "localhost:8080")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://www.strava.com/oauth/authorize"));
    assert!(location.contains("state="));
    assert!(location.contains("scope=read,activity:read_all"));
}

#[tokio::test]
async fn test_logout_tears_down_session() {
    let (app, state, _source) = common::create_test_app(vec![]);
    let token = common::create_test_jwt(99, &state.config.jwt_signing_key);
    common::seed_session(&state, 99);
    assert!(state.sessions.get(99).is_some());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/logout")
                .header(header::COOKIE, format!("pacelog_session={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(state.sessions.get(99).is_none());
}

#[tokio::test]
async fn test_logout_without_cookie_is_harmless() {
    let (app, _state, _source) = common::create_test_app(vec![]);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}
