//! Persistence seam for scan state
//!
//! The orchestrator is the sole writer to a job's rows for the duration of
//! a run; observers poll the same rows for live progress. The store itself
//! is external — implementations here are a Postgres client and an
//! in-memory variant for ephemeral runs and tests.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{AccessibilityIssue, PageResult, ScanJob, Website};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything the crawl core reads from and writes to the external store
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn register_website(&self, website: &Website) -> Result<()>;

    async fn website(&self, id: Uuid) -> Result<Website>;

    /// Creates a job in `pending` state for the given website
    async fn create_job(&self, website_id: Uuid) -> Result<ScanJob>;

    async fn job(&self, id: Uuid) -> Result<ScanJob>;

    async fn mark_running(&self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<()>;

    /// Set once discovery completes
    async fn set_total_pages(&self, job_id: Uuid, total_pages: u32) -> Result<()>;

    async fn record_page(&self, page: &PageResult) -> Result<()>;

    async fn record_issues(&self, page_id: Uuid, issues: &[AccessibilityIssue]) -> Result<()>;

    /// Persists the monotonic progress counters after each page
    async fn update_progress(&self, job_id: Uuid, scanned_pages: u32, total_issues: u64)
        -> Result<()>;

    async fn mark_completed(&self, job_id: Uuid, completed_at: DateTime<Utc>) -> Result<()>;

    async fn mark_failed(
        &self,
        job_id: Uuid,
        error_message: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Page rows for one job, in persistence (discovery) order
    async fn page_results(&self, job_id: Uuid) -> Result<Vec<PageResult>>;
}
