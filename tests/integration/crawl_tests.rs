//! Integration tests for the crawl engine
//!
//! These tests use wiremock to serve a small site and run the full crawl
//! cycle end-to-end over real HTTP.

use crate::common::{article_page, fast_fetch_config, long_paragraph, seeded_context};
use pagesift::config::load_config_with_hash;
use pagesift::{crawl, CrawlConfig, Scraper};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawl_config(max_pages: usize, max_depth: u32) -> CrawlConfig {
    CrawlConfig {
        max_pages,
        max_depth,
        fetch: pagesift::FetchConfig {
            retry_attempts: 1,
            ..fast_fetch_config()
        },
        ..CrawlConfig::default()
    }
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn mount_article(server: &MockServer, route: &str, links: &[&str]) {
    let first = long_paragraph(route);
    let second = long_paragraph("the same site");
    let body = article_page(route, &[first.as_str(), second.as_str()], links);
    mount_page(server, route, body).await;
}

/// Serves `/ -> /a, /b`, `/a -> /c`, `/c -> /d`, plus links that must be ignored
async fn mount_site(server: &MockServer) {
    mount_article(
        server,
        "/",
        &[
            "/a",
            "/b",
            "https://elsewhere.test/x",
            "/brochure.pdf",
            "mailto:team@site.test",
            "#top",
        ],
    )
    .await;
    mount_article(server, "/a", &["/c", "/"]).await;
    mount_article(server, "/b", &[]).await;
    mount_article(server, "/c", &["/d"]).await;

    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/brochure.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let mut ctx = seeded_context();
    let report = crawl(
        &format!("{}/", base_url),
        &crawl_config(10, 2),
        &mut ctx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let visited: Vec<String> = report.documents.iter().map(|d| d.url.clone()).collect();
    assert_eq!(
        visited,
        vec![
            format!("{}/", base_url),
            format!("{}/a", base_url),
            format!("{}/b", base_url),
            format!("{}/c", base_url),
        ]
    );

    let summary = &report.summary;
    assert_eq!(summary.pages_captured, 4);
    assert_eq!(summary.urls_attempted, 4);
    assert_eq!(summary.failed_count, 0);
    assert!((summary.success_rate - 1.0).abs() < f64::EPSILON);
    assert_eq!(summary.max_depth_reached, 2);
    assert!(!summary.cancelled);

    // Only same-site document links are recorded
    let root = &report.documents[0];
    assert_eq!(root.depth, 0);
    assert_eq!(
        root.links,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
    assert!(root.text.contains("This paragraph about /"));
    assert!(!root.text.contains("Copyright"));
    assert!(ctx.is_shut_down());
}

#[tokio::test]
async fn test_depth_one_crawl_captures_root_and_children() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_article(
        &mock_server,
        "/",
        &["/first", "/second", "https://elsewhere.test/page"],
    )
    .await;
    mount_article(&mock_server, "/first", &["/grandchild"]).await;
    mount_article(&mock_server, "/second", &[]).await;
    Mock::given(method("GET"))
        .and(path("/grandchild"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut ctx = seeded_context();
    let report = crawl(
        &format!("{}/", base_url),
        &crawl_config(10, 1),
        &mut ctx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.documents.len(), 3);
    assert_eq!(report.summary.urls_attempted, 3);
    assert!((report.summary.success_rate - 1.0).abs() < f64::EPSILON);
    assert!(report
        .documents
        .iter()
        .all(|doc| doc.url.starts_with(&base_url)));
}

#[tokio::test]
async fn test_crawl_respects_page_budget() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let mut ctx = seeded_context();
    let report = crawl(
        &format!("{}/", mock_server.uri()),
        &crawl_config(2, 2),
        &mut ctx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.summary.urls_attempted, 2);
}

#[tokio::test]
async fn test_crawl_depth_zero_fetches_only_start() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let mut ctx = seeded_context();
    let report = crawl(
        &format!("{}/", mock_server.uri()),
        &crawl_config(10, 0),
        &mut ctx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.summary.max_depth_reached, 0);
}

#[tokio::test]
async fn test_failed_and_thin_pages_are_recorded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_article(&mock_server, "/", &["/gone", "/thin", "/ok"]).await;
    mount_article(&mock_server, "/ok", &[]).await;
    mount_page(
        &mock_server,
        "/thin",
        article_page("Thin", &["Just a short note here."], &[]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut ctx = seeded_context();
    let report = crawl(
        &format!("{}/", base_url),
        &crawl_config(10, 1),
        &mut ctx,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let summary = &report.summary;
    assert_eq!(summary.pages_captured, 2);
    assert_eq!(summary.urls_attempted, 4);
    assert_eq!(
        summary.failed_urls,
        vec![format!("{}/gone", base_url), format!("{}/thin", base_url)]
    );
    assert!((summary.success_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_cancelled_before_start_yields_empty_report() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut ctx = seeded_context();
    let report = crawl(
        &format!("{}/", mock_server.uri()),
        &crawl_config(10, 2),
        &mut ctx,
        &cancel,
    )
    .await
    .unwrap();

    assert!(report.documents.is_empty());
    assert!(report.summary.cancelled);
    assert_eq!(report.summary.urls_attempted, 0);
    assert_eq!(report.summary.success_rate, 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_pacing_delay() {
    let mut ctx = seeded_context();
    let config = CrawlConfig {
        fetch: pagesift::FetchConfig {
            delay_range: (30.0, 60.0),
            ..fast_fetch_config()
        },
        ..CrawlConfig::default()
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let report = crawl("https://site.test/", &config, &mut ctx, &cancel)
        .await
        .unwrap();

    assert!(report.summary.cancelled);
    assert_eq!(report.summary.urls_attempted, 0);
}

#[tokio::test]
async fn test_scraper_from_config_file() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[fetch]
retry-attempts = 1
delay-min-secs = 0.0
delay-max-secs = 0.0

[crawl]
max-pages = 3
max-depth = 1
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let (config, hash) = load_config_with_hash(file.path()).unwrap();
    let scraper = Scraper::new(config).with_config_hash(hash.clone()).with_seed(9);

    let report = scraper
        .crawl(&format!("{}/", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.documents.len(), 3);
    assert_eq!(report.config_hash, Some(hash));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["pages_captured"], 3);
    assert!(json["documents"][0]["text"].as_str().unwrap().len() > 50);
}
