// SPDX-License-Identifier: MIT

//! Activity synchronization engine.
//!
//! Drives pagination against the activity source, filters to runs, and
//! upserts each page into the athlete's partition as one unit. Decides
//! whether a request can be served from the store or needs a live fetch.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::db::ActivityStore;
use crate::error::AppError;
use crate::models::Activity;
use crate::services::session::Session;
use crate::services::strava::StravaActivitySummary;

/// Strava's maximum page size; we always request the ceiling.
pub const PAGE_SIZE: u32 = 200;

/// Paginated read-only activity source (Strava in production).
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch one page of activity summaries. Pages are 1-indexed.
    async fn fetch_page(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError>;
}

/// Where a served activity set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DataOrigin {
    Cache,
    Live,
}

/// Result of syncing one page.
#[derive(Debug)]
pub struct PageSync {
    /// Raw summaries returned by the source, before type filtering
    pub fetched: usize,
    /// Run activities persisted from this page, in fetch order
    pub runs: Vec<Activity>,
}

/// Totals for a full pagination pass.
#[derive(Debug, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncReport {
    pub pages: u32,
    pub fetched: usize,
    pub runs: usize,
}

/// Per-athlete sync engine over pluggable source and store.
#[derive(Clone)]
pub struct Synchronizer {
    source: Arc<dyn ActivitySource>,
    store: Arc<dyn ActivityStore>,
}

impl Synchronizer {
    pub fn new(source: Arc<dyn ActivitySource>, store: Arc<dyn ActivityStore>) -> Self {
        Self { source, store }
    }

    /// Read the athlete's full partition. Empty partition is an empty vec.
    pub async fn load_cached(&self, athlete_id: u64) -> Result<Vec<Activity>, AppError> {
        self.store.read_all(athlete_id).await
    }

    /// Fetch one page, keep the runs, and upsert them as a single unit.
    ///
    /// The page either fully lands in the store or the error surfaces so
    /// the caller can retry; retrying is safe because the write is an
    /// idempotent upsert.
    pub async fn sync_page(
        &self,
        session: &Session,
        page: u32,
        per_page: u32,
    ) -> Result<PageSync, AppError> {
        let summaries = self
            .source
            .fetch_page(&session.access_token, page, per_page)
            .await?;
        let fetched = summaries.len();

        let runs: Vec<Activity> = summaries
            .into_iter()
            .filter(|s| s.sport_type == crate::models::activity::SPORT_RUN)
            .map(|s| s.into_activity(session.athlete_id))
            .collect::<Result<_, _>>()?;

        if !runs.is_empty() {
            self.store.upsert_many(session.athlete_id, &runs).await?;
        }

        tracing::debug!(
            athlete_id = session.athlete_id,
            page,
            fetched,
            runs = runs.len(),
            "Page synced"
        );

        Ok(PageSync { fetched, runs })
    }

    /// Run a full pagination pass from page 1.
    ///
    /// A full page implies more may exist, so we keep going while
    /// `fetched == per_page`; a short page terminates. The source gives no
    /// explicit has-more signal, so a result count that is an exact
    /// multiple of the page size costs one extra (empty) fetch.
    ///
    /// Returns the synced run set in fetch order plus totals.
    pub async fn sync_all(&self, session: &Session) -> Result<(Vec<Activity>, SyncReport), AppError> {
        let mut all_runs = Vec::new();
        let mut report = SyncReport::default();
        let mut page = 1;

        loop {
            let page_sync = self.sync_page(session, page, PAGE_SIZE).await?;
            report.pages += 1;
            report.fetched += page_sync.fetched;
            report.runs += page_sync.runs.len();
            all_runs.extend(page_sync.runs);

            if page_sync.fetched < PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }

        tracing::info!(
            athlete_id = session.athlete_id,
            pages = report.pages,
            fetched = report.fetched,
            runs = report.runs,
            "Sync complete"
        );

        Ok((all_runs, report))
    }

    /// Serve the athlete's run set, preferring the store.
    ///
    /// A non-empty partition is served directly (one store read for the
    /// returning-athlete case). An empty partition triggers a live
    /// pagination pass. A store failure during the cache check is
    /// recoverable: log it and fall through to the live fetch.
    pub async fn load_or_sync(
        &self,
        session: &Session,
    ) -> Result<(Vec<Activity>, DataOrigin), AppError> {
        match self.load_cached(session.athlete_id).await {
            Ok(cached) if !cached.is_empty() => {
                tracing::debug!(
                    athlete_id = session.athlete_id,
                    count = cached.len(),
                    "Serving activities from store"
                );
                return Ok((cached, DataOrigin::Cache));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    athlete_id = session.athlete_id,
                    error = %e,
                    "Store read failed during cache check, falling back to live fetch"
                );
            }
        }

        let (runs, _report) = self.sync_all(session).await?;
        Ok((runs, DataOrigin::Live))
    }
}
