//! Postgres-backed store
//!
//! Thin repository over the external database. All progress writes are
//! single-row updates; the orchestrator is the only writer for a given job,
//! so no transactions are needed beyond per-statement atomicity.

use crate::error::{IrisError, Result};
use crate::models::{AccessibilityIssue, IssueCounts, PageResult, ScanJob, ScanStatus, Website};
use crate::store::ScanStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Column list for scan_jobs queries
const JOB_COLUMNS: &str = "id, website_id, status, started_at, completed_at, \
    total_pages, scanned_pages, total_issues, error_message";

/// Column list for page_results queries
const PAGE_COLUMNS: &str = "id, scan_job_id, url, title, status_code, load_time_ms, \
    critical_count, serious_count, moderate_count, minor_count, total_count";

/// Store backed by a Postgres connection pool
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database and returns a ready store
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Applies the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| IrisError::ConfigError(format!("migration failed: {e}")))?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct WebsiteRow {
    id: Uuid,
    base_url: String,
    max_depth: i32,
    max_pages: i32,
    delay_ms: i64,
}

impl From<WebsiteRow> for Website {
    fn from(row: WebsiteRow) -> Self {
        Website {
            id: row.id,
            base_url: row.base_url,
            max_depth: row.max_depth.max(0) as u32,
            max_pages: row.max_pages.max(0) as u32,
            delay_ms: row.delay_ms.max(0) as u64,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    website_id: Uuid,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    total_pages: i32,
    scanned_pages: i32,
    total_issues: i64,
    error_message: Option<String>,
}

impl TryFrom<JobRow> for ScanJob {
    type Error = IrisError;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(ScanJob {
            id: row.id,
            website_id: row.website_id,
            status: row.status.parse::<ScanStatus>()?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            total_pages: row.total_pages.max(0) as u32,
            scanned_pages: row.scanned_pages.max(0) as u32,
            total_issues: row.total_issues.max(0) as u64,
            error_message: row.error_message,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PageRow {
    id: Uuid,
    scan_job_id: Uuid,
    url: String,
    title: String,
    status_code: i32,
    load_time_ms: i64,
    critical_count: i32,
    serious_count: i32,
    moderate_count: i32,
    minor_count: i32,
    total_count: i32,
}

impl From<PageRow> for PageResult {
    fn from(row: PageRow) -> Self {
        PageResult {
            id: row.id,
            scan_job_id: row.scan_job_id,
            url: row.url,
            title: row.title,
            status_code: u16::try_from(row.status_code).unwrap_or(0),
            load_time_ms: row.load_time_ms.max(0) as u64,
            counts: IssueCounts {
                critical: row.critical_count.max(0) as u32,
                serious: row.serious_count.max(0) as u32,
                moderate: row.moderate_count.max(0) as u32,
                minor: row.minor_count.max(0) as u32,
                total: row.total_count.max(0) as u32,
            },
        }
    }
}

#[async_trait]
impl ScanStore for PgStore {
    async fn register_website(&self, website: &Website) -> Result<()> {
        sqlx::query(
            "INSERT INTO websites (id, base_url, max_depth, max_pages, delay_ms)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(website.id)
        .bind(&website.base_url)
        .bind(website.max_depth as i32)
        .bind(website.max_pages as i32)
        .bind(website.delay_ms as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn website(&self, id: Uuid) -> Result<Website> {
        let row = sqlx::query_as::<_, WebsiteRow>(
            "SELECT id, base_url, max_depth, max_pages, delay_ms FROM websites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(IrisError::WebsiteNotFound(id))?;
        Ok(row.into())
    }

    async fn create_job(&self, website_id: Uuid) -> Result<ScanJob> {
        let job = ScanJob::new(website_id);
        sqlx::query(
            "INSERT INTO scan_jobs (id, website_id, status)
             VALUES ($1, $2, $3)",
        )
        .bind(job.id)
        .bind(job.website_id)
        .bind(job.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(job)
    }

    async fn job(&self, id: Uuid) -> Result<ScanJob> {
        let query = format!("SELECT {JOB_COLUMNS} FROM scan_jobs WHERE id = $1");
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(IrisError::JobNotFound(id))?;
        row.try_into()
    }

    async fn mark_running(&self, job_id: Uuid, started_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE scan_jobs SET status = $2, started_at = $3 WHERE id = $1")
            .bind(job_id)
            .bind(ScanStatus::Running.as_str())
            .bind(started_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_total_pages(&self, job_id: Uuid, total_pages: u32) -> Result<()> {
        sqlx::query("UPDATE scan_jobs SET total_pages = $2 WHERE id = $1")
            .bind(job_id)
            .bind(total_pages as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_page(&self, page: &PageResult) -> Result<()> {
        sqlx::query(
            "INSERT INTO page_results
                (id, scan_job_id, url, title, status_code, load_time_ms,
                 critical_count, serious_count, moderate_count, minor_count, total_count)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(page.id)
        .bind(page.scan_job_id)
        .bind(&page.url)
        .bind(&page.title)
        .bind(i32::from(page.status_code))
        .bind(page.load_time_ms as i64)
        .bind(page.counts.critical as i32)
        .bind(page.counts.serious as i32)
        .bind(page.counts.moderate as i32)
        .bind(page.counts.minor as i32)
        .bind(page.counts.total as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_issues(&self, page_id: Uuid, issues: &[AccessibilityIssue]) -> Result<()> {
        // One scan inserts at most a few dozen issues per page; a statement
        // per row keeps this within sqlx's plain query API.
        for issue in issues {
            sqlx::query(
                "INSERT INTO accessibility_issues
                    (page_result_id, rule_id, severity, description, help, help_url,
                     selector, html_snippet)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(page_id)
            .bind(&issue.rule_id)
            .bind(issue.severity.as_str())
            .bind(&issue.description)
            .bind(&issue.help)
            .bind(&issue.help_url)
            .bind(&issue.selector)
            .bind(&issue.html_snippet)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn update_progress(
        &self,
        job_id: Uuid,
        scanned_pages: u32,
        total_issues: u64,
    ) -> Result<()> {
        sqlx::query("UPDATE scan_jobs SET scanned_pages = $2, total_issues = $3 WHERE id = $1")
            .bind(job_id)
            .bind(scanned_pages as i32)
            .bind(total_issues as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_completed(&self, job_id: Uuid, completed_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE scan_jobs SET status = $2, completed_at = $3 WHERE id = $1")
            .bind(job_id)
            .bind(ScanStatus::Completed.as_str())
            .bind(completed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: Uuid,
        error_message: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE scan_jobs SET status = $2, error_message = $3, completed_at = $4
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(ScanStatus::Failed.as_str())
        .bind(error_message)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn page_results(&self, job_id: Uuid) -> Result<Vec<PageResult>> {
        let query = format!(
            "SELECT {PAGE_COLUMNS} FROM page_results WHERE scan_job_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, PageRow>(&query)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PageResult::from).collect())
    }
}
