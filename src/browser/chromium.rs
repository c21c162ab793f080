//! Chromium-backed implementation of the browser capability traits
//!
//! Uses headless Chromium to render pages, including JavaScript-heavy ones,
//! and extract the final DOM content.

use crate::browser::{BrowserEngine, BrowserLauncher, PageSession};
use crate::config::BrowserSettings;
use crate::error::{IrisError, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{self, EventResponseReceived, ResourceType};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long to drain the network event stream for the document response
/// after a successful navigation.
const RESPONSE_DRAIN: Duration = Duration::from_millis(500);

/// Launches headless Chromium with the configured viewport and user agent
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.settings.viewport_width, self.settings.viewport_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(|e| IrisError::BrowserError(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| IrisError::BrowserError(format!("browser launch: {e}")))?;

        // Drive the CDP message loop as a background task
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        info!("headless browser launched");
        Ok(Box::new(ChromiumEngine {
            browser,
            handler_task,
            user_agent: self.settings.user_agent.clone(),
        }))
    }
}

/// A running Chromium instance
pub struct ChromiumEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_agent: String,
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn open_page(&self) -> Result<Box<dyn PageSession>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| IrisError::BrowserError(format!("new page: {e}")))?;
        page.set_user_agent(self.user_agent.as_str())
            .await
            .map_err(|e| IrisError::BrowserError(format!("set user agent: {e}")))?;
        page.execute(network::EnableParams::default())
            .await
            .map_err(|e| IrisError::BrowserError(format!("enable network events: {e}")))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("browser close: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<u16> {
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| IrisError::BrowserError(format!("event listener: {e}")))?;

        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| IrisError::NavigationError {
                url: url.to_string(),
                reason: format!("navigation timed out after {}s", timeout.as_secs()),
            })?
            .map_err(|e| IrisError::NavigationError {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // The main document response arrives on the network event stream;
        // drain briefly and pick the first Document-type entry.
        let mut status: u16 = 0;
        while let Ok(Some(event)) = tokio::time::timeout(RESPONSE_DRAIN, responses.next()).await {
            if event.r#type == ResourceType::Document {
                status = u16::try_from(event.response.status).unwrap_or(0);
                break;
            }
        }
        if status == 0 {
            // Navigation succeeded but the document response was not observed;
            // 0 is reserved for navigation failure.
            debug!("document response not observed for {url}, assuming 200");
            status = 200;
        }
        Ok(status)
    }

    async fn title(&mut self) -> Result<String> {
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| IrisError::BrowserError(format!("get title: {e}")))?;
        Ok(title.unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String> {
        let html = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| IrisError::BrowserError(format!("serialize DOM: {e}")))?
            .into_value::<String>()
            .unwrap_or_default();
        Ok(html)
    }

    async fn link_hrefs(&mut self) -> Result<Vec<String>> {
        let links_js = r#"
            Array.from(document.querySelectorAll('a[href]'))
                .map(a => a.href)
                .filter(href => href && href.startsWith('http'))
        "#;
        let links = self
            .page
            .evaluate(links_js)
            .await
            .map_err(|e| IrisError::BrowserError(format!("extract links: {e}")))?
            .into_value::<Vec<String>>()
            .unwrap_or_default();
        Ok(links)
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.page.close().await {
            debug!("page close: {e}");
        }
    }
}
