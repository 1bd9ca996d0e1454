// SPDX-License-Identifier: MIT

//! Strava API client.
//!
//! Handles:
//! - Paginated activity listing
//! - Authorization-code exchange
//! - Rate limit and revoked-credential detection

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Activity;
use crate::services::sync::ActivitySource;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a new Strava client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://www.strava.com/api/v3".to_string(),
            client_id,
            client_secret,
        }
    }

    /// List activity summaries, one page at a time.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("page", page.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Exchange an authorization code for a bearer token and athlete identity.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post("https://www.strava.com/oauth/token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::StravaApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("Failed to parse token response: {}", e)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();

            // Unauthorized - credential revoked or expired; fatal to the session
            if status.as_u16() == 401 {
                return Err(AppError::StravaUnauthorized);
            }

            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
                return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl ActivitySource for StravaClient {
    async fn fetch_page(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        self.list_activities(access_token, page, per_page).await
    }
}

/// Summary activity from the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: u64,
    pub name: String,
    pub sport_type: String,
    pub start_date: String,
    pub distance: f64,
    pub moving_time: u32,
    pub average_heartrate: Option<f64>,
}

impl StravaActivitySummary {
    /// Convert to a storable record owned by the given athlete.
    ///
    /// The store sets the real bookkeeping timestamps on write.
    pub fn into_activity(self, athlete_id: u64) -> Result<Activity, AppError> {
        let start_date = chrono::DateTime::parse_from_rfc3339(&self.start_date)
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Invalid Strava start_date for activity {}: {}",
                    self.id,
                    e
                ))
            })?
            .with_timezone(&chrono::Utc);

        let now = chrono::Utc::now();
        Ok(Activity {
            strava_activity_id: self.id,
            athlete_id,
            name: self.name,
            sport_type: self.sport_type,
            distance_meters: self.distance,
            moving_time_seconds: self.moving_time,
            average_heartrate: self.average_heartrate,
            start_date,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub athlete: StravaAthlete,
}

/// Athlete info from OAuth token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    pub firstname: String,
    pub lastname: String,
}
