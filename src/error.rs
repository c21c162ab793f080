//! Error types for the Iris scanner

use thiserror::Error;

/// Main error type for Iris operations
#[derive(Debug, Error)]
pub enum IrisError {
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Navigation failed for {url}: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Check execution error: {0}")]
    CheckError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] sqlx::Error),

    #[error("Scan job {0} not found")]
    JobNotFound(uuid::Uuid),

    #[error("Website {0} not found")]
    WebsiteNotFound(uuid::Uuid),
}

/// Result type alias for Iris operations
pub type Result<T> = std::result::Result<T, IrisError>;
