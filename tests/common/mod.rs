//! Common test utilities
//!
//! A scripted browser implementing the public capability traits, so the
//! discoverer, auditor, and orchestrator can run without Chromium.

#![allow(dead_code)]

use async_trait::async_trait;
use iris::browser::{BrowserEngine, BrowserLauncher, PageSession};
use iris::config::ScanSettings;
use iris::error::{IrisError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One scripted page served by [`FakeBrowser`]
#[derive(Clone, Default)]
pub struct FakePage {
    pub title: String,
    pub html: String,
    pub links: Vec<String>,
    pub status: u16,
    pub fail_navigation: bool,
}

impl FakePage {
    /// A page that passes every accessibility check
    pub fn clean(title: &str, links: &[&str]) -> Self {
        let html = format!(
            r##"<html lang="en"><head><title>{title}</title></head>
            <body><a href="#main">Skip to main content</a><h1>{title}</h1><p>content</p></body></html>"##
        );
        Self {
            title: title.to_string(),
            html,
            links: links.iter().map(|l| l.to_string()).collect(),
            status: 200,
            fail_navigation: false,
        }
    }

    /// A clean page plus one image without alt text (exactly one issue)
    pub fn flawed(title: &str, links: &[&str]) -> Self {
        let mut page = Self::clean(title, links);
        page.html = page
            .html
            .replace("<p>content</p>", r#"<img src="hero.png"><p>content</p>"#);
        page
    }

    /// A page whose navigation always fails
    pub fn unreachable() -> Self {
        Self {
            fail_navigation: true,
            ..Self::default()
        }
    }
}

/// Serves scripted pages keyed by exact URL
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pages: Arc<HashMap<String, FakePage>>,
}

impl FakeBrowser {
    pub fn new(entries: Vec<(&str, FakePage)>) -> Self {
        Self {
            pages: Arc::new(
                entries
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page))
                    .collect(),
            ),
        }
    }

    /// A browser with no pages at all; every navigation fails
    pub fn empty() -> Self {
        Self::default()
    }
}

pub struct FakeSession {
    pages: Arc<HashMap<String, FakePage>>,
    current: Option<FakePage>,
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<u16> {
        match self.pages.get(url) {
            Some(page) if page.fail_navigation => Err(IrisError::NavigationError {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
            Some(page) => {
                self.current = Some(page.clone());
                Ok(page.status)
            }
            None => Err(IrisError::NavigationError {
                url: url.to_string(),
                reason: "no route to host".to_string(),
            }),
        }
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self
            .current
            .as_ref()
            .map(|page| page.title.clone())
            .unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self
            .current
            .as_ref()
            .map(|page| page.html.clone())
            .unwrap_or_default())
    }

    async fn link_hrefs(&mut self) -> Result<Vec<String>> {
        Ok(self
            .current
            .as_ref()
            .map(|page| page.links.clone())
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) {}
}

#[async_trait]
impl BrowserEngine for FakeBrowser {
    async fn open_page(&self) -> Result<Box<dyn PageSession>> {
        Ok(Box::new(FakeSession {
            pages: Arc::clone(&self.pages),
            current: None,
        }))
    }

    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        Ok(Box::new(self.clone()))
    }
}

/// Launcher whose browser never starts
pub struct BrokenLauncher;

#[async_trait]
impl BrowserLauncher for BrokenLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        Err(IrisError::BrowserError(
            "chromium executable not found".to_string(),
        ))
    }
}

/// Fast timings for tests: short navigation timeout, no settle pause
pub fn test_settings() -> ScanSettings {
    ScanSettings {
        nav_timeout_secs: 5,
        settle_ms: 0,
    }
}

pub const NAV_TIMEOUT: Duration = Duration::from_secs(5);
