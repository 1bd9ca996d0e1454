//! Database layer.
//!
//! The store is expressed as a trait so the sync engine can run against
//! Firestore in production and an in-memory map in tests and offline
//! development.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::Activity;

/// Counts reported by a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Documents written for the first time
    pub inserted: usize,
    /// Documents that already existed and were rewritten
    pub updated: usize,
}

/// Durable, per-athlete partitioned activity storage.
///
/// Invariants every implementation must hold:
/// - at most one stored activity per Strava activity ID within a partition
/// - `created_at` survives re-upserts unchanged; `updated_at` is bumped on
///   every write
/// - a call to `upsert_many` is one logical unit: the caller retries the
///   whole page on failure, which is safe because the write is idempotent
/// - partitions never leak into each other
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Insert-or-update one page of activities in an athlete's partition.
    async fn upsert_many(
        &self,
        athlete_id: u64,
        activities: &[Activity],
    ) -> Result<UpsertOutcome, AppError>;

    /// Read the athlete's full partition, Run activities only, most recent
    /// start date first. An empty partition is an empty vec, not an error.
    async fn read_all(&self, athlete_id: u64) -> Result<Vec<Activity>, AppError>;
}

/// Collection naming.
///
/// One collection per athlete; the activity ID is the document ID
/// within it.
pub fn activity_partition(athlete_id: u64) -> String {
    format!("user_{}_activities", athlete_id)
}
