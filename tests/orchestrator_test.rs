//! End-to-end scan job scenarios

mod common;

use common::{test_settings, BrokenLauncher, FakeBrowser, FakePage};
use iris::browser::BrowserLauncher;
use iris::models::{ScanJob, ScanStatus, Website};
use iris::orchestrator::CrawlOrchestrator;
use iris::store::memory::MemoryStore;
use iris::store::ScanStore;
use std::sync::Arc;
use std::time::Duration;

const BASE: &str = "https://example.com/";

fn website(max_depth: u32, max_pages: u32) -> Website {
    Website::new(BASE, max_depth, max_pages, 0)
}

/// Registers the website, creates a pending job, and runs it to a terminal
/// state. Returns the store and the final job row.
async fn run_job(
    launcher: Arc<dyn BrowserLauncher>,
    website: Website,
) -> (Arc<MemoryStore>, ScanJob) {
    let store = Arc::new(MemoryStore::new());
    store
        .register_website(&website)
        .await
        .expect("register website");
    let job = store.create_job(website.id).await.expect("create job");
    assert_eq!(job.status, ScanStatus::Pending);

    let orchestrator = CrawlOrchestrator::new(store.clone(), launcher, test_settings());
    orchestrator.run(website.id, job.id).await;

    let finished = store.job(job.id).await.expect("job row");
    (store, finished)
}

#[tokio::test]
async fn test_full_scan_completes_with_results() {
    let browser = FakeBrowser::new(vec![
        (
            BASE,
            FakePage::flawed(
                "Home",
                &["https://example.com/a", "https://example.com/b"],
            ),
        ),
        ("https://example.com/a", FakePage::clean("A", &[])),
        ("https://example.com/b", FakePage::flawed("B", &[])),
    ]);

    let (store, job) = run_job(Arc::new(browser), website(2, 10)).await;

    assert_eq!(job.status, ScanStatus::Completed);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());
    assert!(job.error_message.is_none());
    assert_eq!(job.total_pages, 3);
    assert_eq!(job.scanned_pages, 3);
    assert_eq!(job.total_issues, 2);

    let pages = store.page_results(job.id).await.expect("pages");
    assert_eq!(pages.len(), 3);
    // Persisted in discovery (breadth-first) order
    assert_eq!(pages[0].url, BASE);
    assert_eq!(pages[1].url, "https://example.com/a");
    assert_eq!(pages[2].url, "https://example.com/b");
    assert_eq!(pages[0].counts.serious, 1);
    assert_eq!(pages[0].counts.total, 1);
    assert_eq!(pages[1].counts.total, 0);

    let issues = store.issues_for_page(pages[0].id).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].rule_id, "image-alt");
}

#[tokio::test]
async fn test_max_pages_bounds_persisted_results() {
    let links: Vec<String> = (0..50)
        .map(|i| format!("https://example.com/page{i}"))
        .collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let mut entries = vec![(BASE, FakePage::clean("Home", &link_refs))];
    for link in &links {
        entries.push((link.as_str(), FakePage::clean("Leaf", &[])));
    }
    let browser = FakeBrowser::new(entries);

    let (store, job) = run_job(Arc::new(browser), website(2, 5)).await;

    assert_eq!(job.status, ScanStatus::Completed);
    assert_eq!(job.total_pages, 5);
    assert_eq!(job.scanned_pages, 5);
    assert_eq!(store.page_results(job.id).await.expect("pages").len(), 5);
}

#[tokio::test]
async fn test_unreachable_page_does_not_fail_the_job() {
    let browser = FakeBrowser::new(vec![
        (
            BASE,
            FakePage::flawed(
                "Home",
                &[
                    "https://example.com/a",
                    "https://example.com/broken",
                    "https://example.com/b",
                ],
            ),
        ),
        ("https://example.com/a", FakePage::flawed("A", &[])),
        ("https://example.com/broken", FakePage::unreachable()),
        ("https://example.com/b", FakePage::clean("B", &[])),
    ]);

    let (store, job) = run_job(Arc::new(browser), website(2, 10)).await;

    assert_eq!(job.status, ScanStatus::Completed, "per-page failure must not fail the job");
    assert_eq!(job.scanned_pages, 4);
    // Only the reachable pages contribute issues
    assert_eq!(job.total_issues, 2);

    let pages = store.page_results(job.id).await.expect("pages");
    assert_eq!(pages.len(), 4);
    let broken = pages
        .iter()
        .find(|p| p.url == "https://example.com/broken")
        .expect("broken page row");
    assert_eq!(broken.status_code, 0);
    assert_eq!(broken.counts.total, 0);
    assert!(broken.title.is_empty());
}

#[tokio::test]
async fn test_unreachable_base_url_still_completes() {
    let (store, job) = run_job(Arc::new(FakeBrowser::empty()), website(2, 10)).await;

    assert_eq!(job.status, ScanStatus::Completed);
    assert_eq!(job.total_pages, 1);
    assert_eq!(job.scanned_pages, 1);
    assert_eq!(job.total_issues, 0);

    let pages = store.page_results(job.id).await.expect("pages");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].url, BASE);
    assert_eq!(pages[0].status_code, 0);
}

#[tokio::test]
async fn test_browser_launch_failure_fails_the_job() {
    let (store, job) = run_job(Arc::new(BrokenLauncher), website(2, 10)).await;

    assert_eq!(job.status, ScanStatus::Failed);
    assert!(job.completed_at.is_some());
    let message = job.error_message.as_deref().expect("error message");
    assert!(!message.is_empty());
    assert!(store.page_results(job.id).await.expect("pages").is_empty());
}

#[tokio::test]
async fn test_invalid_base_url_fails_before_browser_work() {
    let bad = Website::new("not a url", 2, 10, 0);
    let (store, job) = run_job(Arc::new(FakeBrowser::empty()), bad).await;

    assert_eq!(job.status, ScanStatus::Failed);
    let message = job.error_message.as_deref().expect("error message");
    assert!(message.contains("invalid base URL"));
    assert!(store.page_results(job.id).await.expect("pages").is_empty());
}

#[tokio::test]
async fn test_zero_max_pages_is_a_config_error() {
    let bad = Website::new(BASE, 2, 0, 0);
    let (_store, job) = run_job(Arc::new(FakeBrowser::empty()), bad).await;

    assert_eq!(job.status, ScanStatus::Failed);
    assert!(job
        .error_message
        .as_deref()
        .expect("error message")
        .contains("max_pages"));
}

#[tokio::test]
async fn test_missing_website_fails_the_job() {
    let store = Arc::new(MemoryStore::new());
    let job = store.create_job(uuid::Uuid::new_v4()).await.expect("job");

    let orchestrator = CrawlOrchestrator::new(
        store.clone(),
        Arc::new(FakeBrowser::empty()),
        test_settings(),
    );
    orchestrator.run(job.website_id, job.id).await;

    let finished = store.job(job.id).await.expect("job row");
    assert_eq!(finished.status, ScanStatus::Failed);
}

#[tokio::test]
async fn test_spawn_is_fire_and_forget() {
    let browser = FakeBrowser::new(vec![(BASE, FakePage::clean("Home", &[]))]);
    let store = Arc::new(MemoryStore::new());
    let site = website(1, 5);
    store.register_website(&site).await.expect("register");
    let job = store.create_job(site.id).await.expect("job");

    let orchestrator = Arc::new(CrawlOrchestrator::new(
        store.clone(),
        Arc::new(browser),
        test_settings(),
    ));
    let handle = orchestrator.spawn(site.id, job.id);

    // Observe the job the way the UI does: poll the store until terminal
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let current = store.job(job.id).await.expect("job row");
        if current.status.is_terminal() {
            assert_eq!(current.status, ScanStatus::Completed);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job did not reach a terminal state"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.await.expect("spawned task panicked");
}

#[tokio::test]
async fn test_rate_limit_delay_is_applied_between_pages() {
    let browser = FakeBrowser::new(vec![
        (BASE, FakePage::clean("Home", &["https://example.com/a"])),
        ("https://example.com/a", FakePage::clean("A", &[])),
    ]);

    let site = Website::new(BASE, 2, 10, 50);
    let start = std::time::Instant::now();
    let (_store, job) = run_job(Arc::new(browser), site).await;

    assert_eq!(job.status, ScanStatus::Completed);
    assert_eq!(job.scanned_pages, 2);
    // One inter-page delay of 50ms between the two audits
    assert!(start.elapsed() >= Duration::from_millis(50));
}
