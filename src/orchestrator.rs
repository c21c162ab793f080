//! End-to-end scan job execution
//!
//! One orchestrator run owns one browser instance, sequences discovery and
//! per-page auditing, and keeps the externally visible scan-job record
//! accurate after every page. Jobs move `pending -> running -> (completed |
//! failed)` and always reach exactly one terminal state once started.

use crate::audit::PageAuditor;
use crate::browser::{BrowserEngine, BrowserLauncher};
use crate::config::ScanSettings;
use crate::crawler::LinkDiscoverer;
use crate::error::Result;
use crate::models::{PageResult, Website};
use crate::store::ScanStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Runs scan jobs to completion against a store and a browser launcher
pub struct CrawlOrchestrator {
    store: Arc<dyn ScanStore>,
    launcher: Arc<dyn BrowserLauncher>,
    settings: ScanSettings,
}

impl CrawlOrchestrator {
    pub fn new(
        store: Arc<dyn ScanStore>,
        launcher: Arc<dyn BrowserLauncher>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            store,
            launcher,
            settings,
        }
    }

    /// Fire-and-forget entry point: detaches the job onto the runtime and
    /// returns immediately. All failures are absorbed into the job record,
    /// so the task can never surface an unhandled error to its spawner.
    pub fn spawn(self: &Arc<Self>, website_id: Uuid, job_id: Uuid) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run(website_id, job_id).await;
        })
    }

    /// Runs one job to a terminal state. Status-transition writes are
    /// best-effort: a store failure here is logged, never propagated.
    pub async fn run(&self, website_id: Uuid, job_id: Uuid) {
        if let Err(e) = self.store.mark_running(job_id, Utc::now()).await {
            warn!("failed to mark job {job_id} running: {e}");
        }

        match self.execute(website_id, job_id).await {
            Ok(scanned) => {
                info!("scan job {job_id} completed: {scanned} pages");
                if let Err(e) = self.store.mark_completed(job_id, Utc::now()).await {
                    warn!("failed to mark job {job_id} completed: {e}");
                }
            }
            Err(e) => {
                error!("scan job {job_id} failed: {e}");
                if let Err(persist_err) =
                    self.store.mark_failed(job_id, &e.to_string(), Utc::now()).await
                {
                    warn!("failed to mark job {job_id} failed: {persist_err}");
                }
            }
        }
    }

    /// Everything that can fail the whole job: config validation, browser
    /// launch, and discovery. The browser is released on every exit path.
    async fn execute(&self, website_id: Uuid, job_id: Uuid) -> Result<u32> {
        let website = self.store.website(website_id).await?;
        website.validate()?;

        let mut browser = self.launcher.launch().await?;
        let result = self.crawl(browser.as_ref(), job_id, &website).await;
        if let Err(e) = browser.shutdown().await {
            warn!("browser shutdown failed: {e}");
        }
        result
    }

    async fn crawl(
        &self,
        engine: &dyn BrowserEngine,
        job_id: Uuid,
        website: &Website,
    ) -> Result<u32> {
        let discoverer = LinkDiscoverer::new(
            engine,
            website.max_depth,
            website.max_pages as usize,
            self.settings.nav_timeout(),
        );
        let urls = discoverer.discover(&website.base_url).await?;
        self.store.set_total_pages(job_id, urls.len() as u32).await?;

        let auditor = PageAuditor::new(engine, self.settings.nav_timeout(), self.settings.settle());
        let mut scanned_pages: u32 = 0;
        let mut total_issues: u64 = 0;

        for (index, url) in urls.iter().enumerate() {
            match self.audit_one(&auditor, job_id, url).await {
                Ok(issue_count) => {
                    scanned_pages += 1;
                    total_issues += issue_count as u64;
                    if let Err(e) = self
                        .store
                        .update_progress(job_id, scanned_pages, total_issues)
                        .await
                    {
                        warn!("progress update failed for job {job_id}: {e}");
                    }
                }
                // This URL contributes no result row; the crawl continues
                Err(e) => warn!("page audit failed for {url}: {e}"),
            }

            if website.delay_ms > 0 && index + 1 < urls.len() {
                tokio::time::sleep(Duration::from_millis(website.delay_ms)).await;
            }
        }

        Ok(scanned_pages)
    }

    /// Audits one URL and persists its result row plus any issues.
    /// Returns the number of issues found on the page.
    async fn audit_one(&self, auditor: &PageAuditor<'_>, job_id: Uuid, url: &str) -> Result<usize> {
        let audit = auditor.audit(url).await?;
        let page = PageResult::from_audit(job_id, &audit);
        self.store.record_page(&page).await?;
        if !audit.issues.is_empty() {
            self.store.record_issues(page.id, &audit.issues).await?;
        }
        Ok(audit.issues.len())
    }
}
