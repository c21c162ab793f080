//! Core data models for the Iris scanner

use crate::error::IrisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

/// Severity level for accessibility issues
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Serious => "serious",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }

    /// Returns the color name for terminal output
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Critical => "red",
            Severity::Serious => "bright red",
            Severity::Moderate => "yellow",
            Severity::Minor => "blue",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = IrisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "serious" => Ok(Severity::Serious),
            "moderate" => Ok(Severity::Moderate),
            "minor" => Ok(Severity::Minor),
            other => Err(IrisError::ConfigError(format!("unknown severity '{other}'"))),
        }
    }
}

/// Lifecycle status of a scan job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = IrisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "running" => Ok(ScanStatus::Running),
            "completed" => Ok(ScanStatus::Completed),
            "failed" => Ok(ScanStatus::Failed),
            other => Err(IrisError::ConfigError(format!("unknown scan status '{other}'"))),
        }
    }
}

/// Website configuration a scan job runs against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    pub id: Uuid,
    /// Absolute base URL the crawl starts from
    pub base_url: String,
    /// Maximum link-follow depth from the base URL
    pub max_depth: u32,
    /// Maximum number of pages discovered and audited per scan
    pub max_pages: u32,
    /// Delay between page visits in milliseconds (0 = none)
    pub delay_ms: u64,
}

impl Website {
    pub fn new(base_url: impl Into<String>, max_depth: u32, max_pages: u32, delay_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            base_url: base_url.into(),
            max_depth,
            max_pages,
            delay_ms,
        }
    }

    /// Validates the configuration before any browser work starts
    pub fn validate(&self) -> crate::error::Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            IrisError::ConfigError(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        if url.host_str().is_none() {
            return Err(IrisError::ConfigError(format!(
                "base URL '{}' has no host",
                self.base_url
            )));
        }
        if self.max_pages == 0 {
            return Err(IrisError::ConfigError("max_pages must be at least 1".to_string()));
        }
        Ok(url)
    }
}

/// One crawl run against one website configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: Uuid,
    pub website_id: Uuid,
    pub status: ScanStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set once discovery completes
    pub total_pages: u32,
    /// Monotonically increasing, persisted after every page
    pub scanned_pages: u32,
    /// Monotonically increasing, persisted after every page
    pub total_issues: u64,
    pub error_message: Option<String>,
}

impl ScanJob {
    /// Creates a new job in `pending` state
    pub fn new(website_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            website_id,
            status: ScanStatus::Pending,
            started_at: None,
            completed_at: None,
            total_pages: 0,
            scanned_pages: 0,
            total_issues: 0,
            error_message: None,
        }
    }
}

/// One detected violation on a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessibilityIssue {
    /// Stable short rule code, e.g. "image-alt"
    pub rule_id: String,
    pub severity: Severity,
    pub description: String,
    pub help: Option<String>,
    pub help_url: Option<String>,
    /// Best-effort locator for the offending element (tag + ordinal)
    pub selector: Option<String>,
    /// Truncated snapshot of the element's serialized markup
    pub html_snippet: Option<String>,
}

/// Issue counts broken down by severity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueCounts {
    pub critical: u32,
    pub serious: u32,
    pub moderate: u32,
    pub minor: u32,
    pub total: u32,
}

impl IssueCounts {
    /// Tallies a list of issues into per-severity counts
    pub fn tally(issues: &[AccessibilityIssue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Serious => counts.serious += 1,
                Severity::Moderate => counts.moderate += 1,
                Severity::Minor => counts.minor += 1,
            }
            counts.total += 1;
        }
        counts
    }
}

/// Outcome of auditing a single URL
#[derive(Debug, Clone)]
pub struct PageAudit {
    pub url: String,
    pub title: String,
    /// 0 if navigation failed
    pub status_code: u16,
    pub load_time_ms: u64,
    pub issues: Vec<AccessibilityIssue>,
}

/// Persisted result row for one audited URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub id: Uuid,
    pub scan_job_id: Uuid,
    pub url: String,
    pub title: String,
    pub status_code: u16,
    pub load_time_ms: u64,
    pub counts: IssueCounts,
}

impl PageResult {
    /// Builds a result row from an audit, generating a fresh row id
    pub fn from_audit(scan_job_id: Uuid, audit: &PageAudit) -> Self {
        Self {
            id: Uuid::new_v4(),
            scan_job_id,
            url: audit.url.clone(),
            title: audit.title.clone(),
            status_code: audit.status_code,
            load_time_ms: audit.load_time_ms,
            counts: IssueCounts::tally(&audit.issues),
        }
    }
}
