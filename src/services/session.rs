// SPDX-License-Identifier: MIT

//! In-memory athlete sessions.
//!
//! A session holds the bearer credential and athlete identity produced by
//! the OAuth exchange. It lives only in process memory: created on a
//! successful exchange, removed on logout or when Strava rejects the
//! credential. Nothing here is persisted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// One athlete's authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub athlete_id: u64,
    pub athlete_name: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(athlete_id: u64, athlete_name: String, access_token: String) -> Self {
        Self {
            athlete_id,
            athlete_name,
            access_token,
            created_at: Utc::now(),
        }
    }
}

/// Shared session map, keyed by athlete ID.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<u64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.athlete_id, session);
    }

    pub fn get(&self, athlete_id: u64) -> Option<Session> {
        self.sessions.get(&athlete_id).map(|s| s.clone())
    }

    /// Tear a session down. Idempotent.
    pub fn remove(&self, athlete_id: u64) {
        if self.sessions.remove(&athlete_id).is_some() {
            tracing::info!(athlete_id, "Session removed");
        }
    }
}
