// SPDX-License-Identifier: MIT

//! Strava OAuth authentication routes.
//!
//! The authorization-code exchange is the only credential interaction this
//! service performs; the resulting bearer token lives in the in-memory
//! session store for the lifetime of the session.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, Claims, SESSION_COOKIE};
use crate::services::Session;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/strava", get(auth_start))
        .route("/auth/strava/callback", get(auth_callback))
        .route("/auth/logout", get(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to Strava authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    // State carries "frontend_url|timestamp_hex|signature_hex", HMAC-signed
    // so the callback can trust the redirect target.
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let state_payload = format!("{}|{:x}", frontend_url, timestamp);

    let mut mac = HmacSha256::new_from_slice(&state.config.oauth_state_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let oauth_state = URL_SAFE_NO_PAD.encode(format!("{}|{}", state_payload, signature).as_bytes());

    let callback_url = format!("{}/auth/strava/callback", service_url(&headers));

    let auth_url = format!(
        "https://www.strava.com/oauth/authorize?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope=read,activity:read_all&\
         state={}",
        state.config.strava_client_id,
        urlencoding::encode(&callback_url),
        oauth_state
    );

    tracing::info!(
        client_id = %state.config.strava_client_id,
        frontend_url = %frontend_url,
        "Starting OAuth flow, redirecting to Strava"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: String,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, create in-memory session, set cookie.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let frontend_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Athlete declined, or Strava reported an error
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        let redirect = format!("{}?error={}", frontend_url, error);
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    tracing::info!("Exchanging authorization code for bearer token");

    let exchange = state.strava.exchange_code(&params.code).await?;
    let athlete_id = exchange.athlete.id;
    let athlete_name = format!("{} {}", exchange.athlete.firstname, exchange.athlete.lastname);

    state.sessions.insert(Session::new(
        athlete_id,
        athlete_name.clone(),
        exchange.access_token,
    ));

    let jwt = create_jwt(athlete_id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(1))
        .build();

    tracing::info!(athlete_id, athlete = %athlete_name, "Session created");

    Ok((jar.add(cookie), Redirect::temporary(&frontend_url)))
}

/// Logout - tear the session down and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(athlete_id) = athlete_id_from_jwt(cookie.value(), &state.config.jwt_signing_key)
        {
            state.sessions.remove(athlete_id);
        }
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Redirect::temporary(&state.config.frontend_url))
}

/// Best-effort athlete ID extraction for logout; invalid tokens are ignored.
fn athlete_id_from_jwt(token: &str, signing_key: &[u8]) -> Option<u64> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let key = DecodingKey::from_secret(signing_key);
    let data = decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256)).ok()?;
    data.claims.sub.parse().ok()
}

/// Derive this service's externally visible URL from the Host header.
fn service_url(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}", scheme, host)
}

/// Verify HMAC signature and decode the frontend URL from the OAuth state.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }
    let (frontend_url, timestamp_hex, signature_hex) = (parts[0], parts[1], parts[2]);

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_state(secret: &[u8], frontend_url: &str) -> String {
        let payload = format!("{}|{:x}", frontend_url, 1234567890u128);
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature).as_bytes())
    }

    #[test]
    fn test_verify_and_decode_state_success() {
        let state = signed_state(b"secret_key", "https://example.com");
        let result = verify_and_decode_state(&state, b"secret_key");
        assert_eq!(result, Some("https://example.com".to_string()));
    }

    #[test]
    fn test_verify_and_decode_state_wrong_secret() {
        let state = signed_state(b"secret_key", "https://example.com");
        assert_eq!(verify_and_decode_state(&state, b"wrong_key"), None);
    }

    #[test]
    fn test_verify_and_decode_state_tampered_signature() {
        let payload = format!("{}|{:x}", "https://example.com", 1234567890u128);
        let state = URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, "bogus").as_bytes());
        assert_eq!(verify_and_decode_state(&state, b"secret_key"), None);
    }

    #[test]
    fn test_verify_and_decode_state_malformed() {
        let state = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_and_decode_state(&state, b"secret_key"), None);
    }
}
