//! Headless browser abstraction
//!
//! The crawl core only needs a narrow slice of a rendering engine: open a
//! tab, navigate with a timeout, read the title and serialized DOM, list
//! hyperlink targets, close the tab. Everything browser-specific lives
//! behind these traits so the discoverer, auditor, and orchestrator can be
//! exercised against a scripted implementation.

pub mod chromium;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Launches one browser process per scan job
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>>;
}

/// A running browser instance, exclusively owned by one orchestrator run
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Opens a fresh page/tab
    async fn open_page(&self) -> Result<Box<dyn PageSession>>;

    /// Shuts the browser down, releasing the underlying process
    async fn shutdown(&mut self) -> Result<()>;
}

/// One tab, scoped to exactly one URL's lifecycle
#[async_trait]
pub trait PageSession: Send {
    /// Navigates to `url`, waiting at most `timeout` for the DOM to be ready.
    /// Returns the HTTP status code of the document response.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<u16>;

    /// Current document title
    async fn title(&mut self) -> Result<String>;

    /// Serialized DOM after client-side rendering
    async fn content(&mut self) -> Result<String>;

    /// Absolute hyperlink targets present in the rendered DOM
    async fn link_hrefs(&mut self) -> Result<Vec<String>>;

    /// Closes the tab. Must be called on every exit path.
    async fn close(self: Box<Self>);
}
