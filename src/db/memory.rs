// SPDX-License-Identifier: MIT

//! In-memory activity store.
//!
//! Backs the integration tests and offline development; same partition and
//! bookkeeping semantics as the Firestore store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

use crate::db::{ActivityStore, UpsertOutcome};
use crate::error::AppError;
use crate::models::Activity;

/// Activity partitions keyed by athlete ID.
#[derive(Default)]
pub struct MemoryStore {
    partitions: DashMap<u64, HashMap<u64, Activity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw document count in one partition, for tests.
    pub fn partition_len(&self, athlete_id: u64) -> usize {
        self.partitions
            .get(&athlete_id)
            .map(|p| p.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn upsert_many(
        &self,
        athlete_id: u64,
        activities: &[Activity],
    ) -> Result<UpsertOutcome, AppError> {
        let now = chrono::Utc::now();
        let mut partition = self.partitions.entry(athlete_id).or_default();
        let mut outcome = UpsertOutcome::default();

        for activity in activities {
            let mut doc = activity.clone();
            doc.athlete_id = athlete_id;
            doc.updated_at = now;
            match partition.get(&doc.strava_activity_id) {
                Some(existing) => {
                    doc.created_at = existing.created_at;
                    outcome.updated += 1;
                }
                None => {
                    doc.created_at = now;
                    outcome.inserted += 1;
                }
            }
            partition.insert(doc.strava_activity_id, doc);
        }

        Ok(outcome)
    }

    async fn read_all(&self, athlete_id: u64) -> Result<Vec<Activity>, AppError> {
        let mut runs: Vec<Activity> = self
            .partitions
            .get(&athlete_id)
            .map(|p| p.values().filter(|a| a.is_run()).cloned().collect())
            .unwrap_or_default();

        runs.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(runs)
    }
}
