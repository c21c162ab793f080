//! In-memory store for ephemeral scans and tests

use crate::error::{IrisError, Result};
use crate::models::{AccessibilityIssue, PageResult, ScanJob, ScanStatus, Website};
use crate::store::ScanStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    websites: HashMap<Uuid, Website>,
    jobs: HashMap<Uuid, ScanJob>,
    pages: Vec<PageResult>,
    issues: HashMap<Uuid, Vec<AccessibilityIssue>>,
}

/// Keeps all scan state in process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues recorded for one page result
    pub async fn issues_for_page(&self, page_id: Uuid) -> Vec<AccessibilityIssue> {
        self.inner
            .lock()
            .await
            .issues
            .get(&page_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn register_website(&self, website: &Website) -> Result<()> {
        self.inner
            .lock()
            .await
            .websites
            .insert(website.id, website.clone());
        Ok(())
    }

    async fn website(&self, id: Uuid) -> Result<Website> {
        self.inner
            .lock()
            .await
            .websites
            .get(&id)
            .cloned()
            .ok_or(IrisError::WebsiteNotFound(id))
    }

    async fn create_job(&self, website_id: Uuid) -> Result<ScanJob> {
        let job = ScanJob::new(website_id);
        self.inner.lock().await.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn job(&self, id: Uuid) -> Result<ScanJob> {
        self.inner
            .lock()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or(IrisError::JobNotFound(id))
    }

    async fn mark_running(&self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let job = inner.jobs.get_mut(&job_id).ok_or(IrisError::JobNotFound(job_id))?;
        job.status = ScanStatus::Running;
        job.started_at = Some(started_at);
        Ok(())
    }

    async fn set_total_pages(&self, job_id: Uuid, total_pages: u32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let job = inner.jobs.get_mut(&job_id).ok_or(IrisError::JobNotFound(job_id))?;
        job.total_pages = total_pages;
        Ok(())
    }

    async fn record_page(&self, page: &PageResult) -> Result<()> {
        self.inner.lock().await.pages.push(page.clone());
        Ok(())
    }

    async fn record_issues(&self, page_id: Uuid, issues: &[AccessibilityIssue]) -> Result<()> {
        self.inner
            .lock()
            .await
            .issues
            .entry(page_id)
            .or_default()
            .extend_from_slice(issues);
        Ok(())
    }

    async fn update_progress(
        &self,
        job_id: Uuid,
        scanned_pages: u32,
        total_issues: u64,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let job = inner.jobs.get_mut(&job_id).ok_or(IrisError::JobNotFound(job_id))?;
        job.scanned_pages = scanned_pages;
        job.total_issues = total_issues;
        Ok(())
    }

    async fn mark_completed(&self, job_id: Uuid, completed_at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let job = inner.jobs.get_mut(&job_id).ok_or(IrisError::JobNotFound(job_id))?;
        job.status = ScanStatus::Completed;
        job.completed_at = Some(completed_at);
        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: Uuid,
        error_message: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let job = inner.jobs.get_mut(&job_id).ok_or(IrisError::JobNotFound(job_id))?;
        job.status = ScanStatus::Failed;
        job.error_message = Some(error_message.to_string());
        job.completed_at = Some(completed_at);
        Ok(())
    }

    async fn page_results(&self, job_id: Uuid) -> Result<Vec<PageResult>> {
        Ok(self
            .inner
            .lock()
            .await
            .pages
            .iter()
            .filter(|page| page.scan_job_id == job_id)
            .cloned()
            .collect())
    }
}
