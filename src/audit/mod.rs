//! Single-page accessibility auditing
//!
//! Renders one URL in a fresh tab, waits for client-side rendering to
//! settle, and runs the check battery against the serialized DOM.

pub mod checks;

use crate::browser::{BrowserEngine, PageSession};
use crate::error::{IrisError, Result};
use crate::models::{AccessibilityIssue, PageAudit};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Audits one URL at a time using the shared browser instance
pub struct PageAuditor<'a> {
    engine: &'a dyn BrowserEngine,
    nav_timeout: Duration,
    settle: Duration,
}

impl<'a> PageAuditor<'a> {
    pub fn new(engine: &'a dyn BrowserEngine, nav_timeout: Duration, settle: Duration) -> Self {
        Self {
            engine,
            nav_timeout,
            settle,
        }
    }

    /// Loads `url` and reports title, HTTP status, load time, and issues.
    ///
    /// A navigation failure or timeout is a recorded partial result
    /// (`status_code = 0`, no issues), not an error; only tab-level
    /// breakage (open/evaluate failures) propagates. The tab is closed on
    /// every exit path.
    pub async fn audit(&self, url: &str) -> Result<PageAudit> {
        let mut page = self.engine.open_page().await?;
        let started = Instant::now();
        let outcome = self.audit_on_page(page.as_mut(), url).await;
        page.close().await;

        let load_time_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok((status_code, title, issues)) => {
                debug!("audited {url}: status {status_code}, {} issues", issues.len());
                Ok(PageAudit {
                    url: url.to_string(),
                    title,
                    status_code,
                    load_time_ms,
                    issues,
                })
            }
            Err(IrisError::NavigationError { reason, .. }) => {
                warn!("navigation failed for {url}: {reason}");
                Ok(PageAudit {
                    url: url.to_string(),
                    title: String::new(),
                    status_code: 0,
                    load_time_ms,
                    issues: Vec::new(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn audit_on_page(
        &self,
        page: &mut dyn PageSession,
        url: &str,
    ) -> Result<(u16, String, Vec<AccessibilityIssue>)> {
        let status_code = page.navigate(url, self.nav_timeout).await?;
        // Let client-side rendering frameworks finish mutating the DOM
        tokio::time::sleep(self.settle).await;
        let title = page.title().await.unwrap_or_default();
        let html = page.content().await?;
        let issues = checks::run_battery(&html);
        Ok((status_code, title, issues))
    }
}
