// SPDX-License-Identifier: MIT

//! Firestore-backed activity store.
//!
//! One collection per athlete partition (`user_{athlete_id}_activities`),
//! documents keyed by Strava activity ID. A page upsert runs as a single
//! Firestore transaction so the page lands or fails as one unit.

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;

use crate::db::{activity_partition, ActivityStore, UpsertOutcome};
use crate::error::AppError;
use crate::models::activity::SPORT_RUN;
use crate::models::Activity;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Fetch `created_at` for the documents that already exist, so a
    /// re-upsert keeps the original insertion time.
    async fn existing_created_at(
        &self,
        collection: &str,
        ids: &[u64],
    ) -> Result<HashMap<u64, chrono::DateTime<chrono::Utc>>, AppError> {
        let client = self.get_client()?;

        let results: Vec<Option<(u64, chrono::DateTime<chrono::Utc>)>> =
            stream::iter(ids.to_vec())
                .map(|id| {
                    let collection = collection.to_string();
                    async move {
                        let existing: Option<Activity> = client
                            .fluent()
                            .select()
                            .by_id_in(&collection)
                            .obj()
                            .one(&id.to_string())
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;

                        Ok::<_, AppError>(existing.map(|a| (id, a.created_at)))
                    }
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .collect::<Vec<Result<_, AppError>>>()
                .await
                .into_iter()
                .collect::<Result<Vec<_>, AppError>>()?;

        Ok(results.into_iter().flatten().collect())
    }
}

#[async_trait]
impl ActivityStore for FirestoreStore {
    /// The existing-`created_at` lookup runs before the transaction
    /// begins, so preservation is read-then-write. Each partition has a
    /// single writer (the owning athlete's sync), so the read cannot race
    /// a concurrent insert of the same document.
    async fn upsert_many(
        &self,
        athlete_id: u64,
        activities: &[Activity],
    ) -> Result<UpsertOutcome, AppError> {
        if activities.is_empty() {
            return Ok(UpsertOutcome::default());
        }

        let collection = activity_partition(athlete_id);
        let ids: Vec<u64> = activities.iter().map(|a| a.strava_activity_id).collect();
        let existing = self.existing_created_at(&collection, &ids).await?;

        let now = chrono::Utc::now();
        let mut outcome = UpsertOutcome::default();

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for activity in activities {
            let mut doc = activity.clone();
            doc.athlete_id = athlete_id;
            doc.updated_at = now;
            match existing.get(&activity.strava_activity_id) {
                Some(created_at) => {
                    doc.created_at = *created_at;
                    outcome.updated += 1;
                }
                None => {
                    doc.created_at = now;
                    outcome.inserted += 1;
                }
            }

            self.get_client()?
                .fluent()
                .update()
                .in_col(&collection)
                .document_id(doc.strava_activity_id.to_string())
                .object(&doc)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add activity to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            athlete_id,
            inserted = outcome.inserted,
            updated = outcome.updated,
            "Page upserted"
        );

        Ok(outcome)
    }

    async fn read_all(&self, athlete_id: u64) -> Result<Vec<Activity>, AppError> {
        let collection = activity_partition(athlete_id);

        self.get_client()?
            .fluent()
            .select()
            .from(collection.as_str())
            .filter(|q| q.field("sport_type").eq(SPORT_RUN))
            .order_by([(
                "start_date",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
