//! Configuration management for the Iris scanner

use crate::error::{IrisError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1366,
            viewport_height: 768,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36 IrisScanner/0.1"
                .to_string(),
        }
    }
}

/// Per-page timing settings for discovery and auditing
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Maximum time to wait for a navigation to settle
    pub nav_timeout_secs: u64,
    /// Pause after navigation so client-side frameworks finish mutating the DOM
    pub settle_ms: u64,
}

impl ScanSettings {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            nav_timeout_secs: 30,
            settle_ms: 1500,
        }
    }
}

/// Full runtime configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub browser: BrowserSettings,
    pub scan: ScanSettings,
    pub database_url: Option<String>,
}

/// File-based configuration structure matching default.toml
#[derive(Debug, Deserialize)]
struct FileConfig {
    browser: Option<BrowserSection>,
    scan: Option<ScanSection>,
    store: Option<StoreSection>,
}

#[derive(Debug, Deserialize)]
struct BrowserSection {
    viewport_width: Option<u32>,
    viewport_height: Option<u32>,
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScanSection {
    nav_timeout_secs: Option<u64>,
    settle_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StoreSection {
    database_url: Option<String>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(IrisError::IoError)?;
    let file_config: FileConfig = toml::from_str(&content)?;

    let mut config = AppConfig::default();

    if let Some(browser) = file_config.browser {
        if let Some(width) = browser.viewport_width {
            config.browser.viewport_width = width;
        }
        if let Some(height) = browser.viewport_height {
            config.browser.viewport_height = height;
        }
        if let Some(ua) = browser.user_agent {
            config.browser.user_agent = ua;
        }
    }

    if let Some(scan) = file_config.scan {
        if let Some(timeout) = scan.nav_timeout_secs {
            config.scan.nav_timeout_secs = timeout;
        }
        if let Some(settle) = scan.settle_ms {
            config.scan.settle_ms = settle;
        }
    }

    if let Some(store) = file_config.store {
        config.database_url = store.database_url;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scan.nav_timeout(), Duration::from_secs(30));
        assert_eq!(config.scan.settle(), Duration::from_millis(1500));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_parse_partial_file() {
        let parsed: FileConfig = toml::from_str(
            r#"
            [scan]
            settle_ms = 250

            [store]
            database_url = "postgres://localhost/iris"
            "#,
        )
        .expect("valid toml");

        let mut config = AppConfig::default();
        if let Some(scan) = parsed.scan {
            if let Some(settle) = scan.settle_ms {
                config.scan.settle_ms = settle;
            }
        }
        if let Some(store) = parsed.store {
            config.database_url = store.database_url;
        }

        assert_eq!(config.scan.settle_ms, 250);
        // Unset fields keep their defaults
        assert_eq!(config.scan.nav_timeout_secs, 30);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/iris"));
    }
}
