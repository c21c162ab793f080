//! Bounded breadth-first link discovery
//!
//! Renders pages in the shared headless browser, extracts same-host
//! hyperlinks, and returns the discovered URLs in first-discovery order
//! subject to depth and page-count limits.

use crate::browser::BrowserEngine;
use crate::error::{IrisError, Result};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Path extensions that never lead to auditable documents
const SKIP_EXTENSIONS: [&str; 4] = [".pdf", ".jpg", ".png", ".gif"];

/// Path segments excluded from traversal
const SKIP_SEGMENTS: [&str; 2] = ["/api/", "/admin/"];

/// Breadth-first discoverer that finds URLs to audit within a target site
pub struct LinkDiscoverer<'a> {
    engine: &'a dyn BrowserEngine,
    max_depth: u32,
    max_pages: usize,
    nav_timeout: Duration,
}

impl<'a> LinkDiscoverer<'a> {
    pub fn new(
        engine: &'a dyn BrowserEngine,
        max_depth: u32,
        max_pages: usize,
        nav_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            max_depth,
            max_pages,
            nav_timeout,
        }
    }

    /// Crawls from `base_url` and returns discovered URLs in breadth-first
    /// order, never more than `max_pages` entries.
    ///
    /// A URL is discovered one depth before it is expanded: items dequeued
    /// at `depth >= max_depth` stay in the result but contribute no links.
    /// Per-URL navigation failures are logged and skipped; discovery as a
    /// whole only fails on a malformed base URL.
    pub async fn discover(&self, base_url: &str) -> Result<Vec<String>> {
        let base = Url::parse(base_url).map_err(|e| {
            IrisError::ConfigError(format!("invalid base URL '{base_url}': {e}"))
        })?;
        let base_host = base
            .host_str()
            .ok_or_else(|| IrisError::ConfigError(format!("base URL '{base_url}' has no host")))?
            .to_string();

        // Seed with the normalized form so links back to the base dedup
        let base_str = base.to_string();
        let mut discovered: Vec<String> = vec![base_str.clone()];
        let mut seen: HashSet<String> = HashSet::from([base_str.clone()]);
        let mut queue: VecDeque<(String, u32)> = VecDeque::from([(base_str, 0)]);

        while let Some((url, depth)) = queue.pop_front() {
            if discovered.len() >= self.max_pages {
                info!("discovery reached max page limit ({})", self.max_pages);
                break;
            }
            if depth >= self.max_depth {
                continue;
            }

            let links = match self.fetch_links(&url).await {
                Ok(links) => links,
                Err(e) => {
                    warn!("discovery failed to render {url}: {e}");
                    continue;
                }
            };
            debug!("depth {depth}: {url} yielded {} raw links", links.len());

            for raw in links {
                if discovered.len() >= self.max_pages {
                    break;
                }
                let Some(candidate) = accept_link(&raw, &base_host) else {
                    continue;
                };
                if seen.insert(candidate.clone()) {
                    discovered.push(candidate.clone());
                    queue.push_back((candidate, depth + 1));
                }
            }
        }

        discovered.truncate(self.max_pages);
        info!("discovery finished: {} URLs", discovered.len());
        Ok(discovered)
    }

    /// Opens a tab, renders one URL, and returns its hyperlink targets.
    /// The tab is closed on every exit path.
    async fn fetch_links(&self, url: &str) -> Result<Vec<String>> {
        let mut page = self.engine.open_page().await?;
        let outcome = async {
            page.navigate(url, self.nav_timeout).await?;
            page.link_hrefs().await
        }
        .await;
        page.close().await;
        outcome
    }
}

/// Applies the same-host and denylist filters to one raw link target.
/// Returns the normalized URL if it should be crawled, `None` otherwise.
/// Invalid targets are silently dropped.
fn accept_link(raw: &str, base_host: &str) -> Option<String> {
    let mut parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    // Exact host match only; subdomains are different hosts
    if parsed.host_str() != Some(base_host) {
        return None;
    }
    let path = parsed.path().to_ascii_lowercase();
    if SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }
    if SKIP_SEGMENTS.iter().any(|segment| path.contains(segment)) {
        return None;
    }
    parsed.set_fragment(None);
    Some(parsed.to_string())
}
