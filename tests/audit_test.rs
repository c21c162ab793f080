//! Integration tests for the page auditor

mod common;

use common::{FakeBrowser, FakePage, NAV_TIMEOUT};
use iris::audit::PageAuditor;
use iris::models::Severity;
use std::time::Duration;

const URL: &str = "https://example.com/page";

fn auditor(browser: &FakeBrowser) -> PageAuditor<'_> {
    PageAuditor::new(browser, NAV_TIMEOUT, Duration::ZERO)
}

#[tokio::test]
async fn test_audit_clean_page() {
    let browser = FakeBrowser::new(vec![(URL, FakePage::clean("Welcome", &[]))]);
    let audit = auditor(&browser).audit(URL).await.expect("audit failed");

    assert_eq!(audit.url, URL);
    assert_eq!(audit.title, "Welcome");
    assert_eq!(audit.status_code, 200);
    assert!(audit.issues.is_empty());
}

#[tokio::test]
async fn test_audit_reports_issues() {
    let browser = FakeBrowser::new(vec![(URL, FakePage::flawed("Welcome", &[]))]);
    let audit = auditor(&browser).audit(URL).await.expect("audit failed");

    assert_eq!(audit.issues.len(), 1);
    assert_eq!(audit.issues[0].rule_id, "image-alt");
    assert_eq!(audit.issues[0].severity, Severity::Serious);
    assert!(audit.issues[0].html_snippet.is_some());
}

#[tokio::test]
async fn test_audit_multiple_issue_kinds() {
    let page = FakePage {
        title: String::new(),
        // No title, no lang, no h1, no skip link, bare input, positive tabindex
        html: r#"<html><body><input type="text"><div tabindex="2">x</div></body></html>"#
            .to_string(),
        links: Vec::new(),
        status: 200,
        fail_navigation: false,
    };
    let browser = FakeBrowser::new(vec![(URL, page)]);
    let audit = auditor(&browser).audit(URL).await.expect("audit failed");

    let ids: Vec<&str> = audit.issues.iter().map(|i| i.rule_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "label",
            "document-title",
            "html-has-lang",
            "page-has-heading-one",
            "skip-link",
            "tabindex",
        ]
    );
}

#[tokio::test]
async fn test_navigation_failure_is_partial_result() {
    let browser = FakeBrowser::new(vec![(URL, FakePage::unreachable())]);
    let audit = auditor(&browser).audit(URL).await.expect("audit failed");

    assert_eq!(audit.status_code, 0);
    assert!(audit.title.is_empty());
    assert!(audit.issues.is_empty());
}

#[tokio::test]
async fn test_unknown_url_is_partial_result() {
    let browser = FakeBrowser::empty();
    let audit = auditor(&browser).audit(URL).await.expect("audit failed");

    assert_eq!(audit.status_code, 0);
    assert!(audit.issues.is_empty());
}

#[tokio::test]
async fn test_audit_preserves_http_status() {
    let mut page = FakePage::clean("Not Found", &[]);
    page.status = 404;
    let browser = FakeBrowser::new(vec![(URL, page)]);
    let audit = auditor(&browser).audit(URL).await.expect("audit failed");

    assert_eq!(audit.status_code, 404);
}
