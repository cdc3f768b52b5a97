//! Crawl phase tests
//!
//! Each test runs a full crawl against a mock server and checks the discovery
//! records that came out of it.

use crate::{html_page, test_config};
use sitescribe::config::CrawlTarget;
use sitescribe::crawler::{crawl, Coordinator};
use sitescribe::storage::{discovery_path, read_discovery_file, MemoryDiscoverySink};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sorted_urls(sink: &MemoryDiscoverySink) -> Vec<String> {
    let mut urls: Vec<String> = sink.records().into_iter().map(|r| r.url).collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_single_page_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", "<p>Nothing to follow here.</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let file = discovery_path(dir.path(), &target.seed, None);

    let summary = crawl(&test_config(), target, &file).await.unwrap();

    let records = read_discovery_file(&file).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, format!("{}/", server.uri()));
    assert_eq!(summary.pages_discovered, 1);
    assert!(!summary.interrupted);
}

#[tokio::test]
async fn test_cycle_visits_each_page_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/about">About</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page(
            "About",
            r#"<a href="/">Home</a><a href="/about#team">Team</a><a href="/about/">Again</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let target = CrawlTarget::from_seed(&format!("{}/", server.uri()), None).unwrap();
    let sink = Arc::new(MemoryDiscoverySink::new());
    let coordinator = Coordinator::new(&test_config(), target, sink.clone()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(
        sorted_urls(&sink),
        vec![format!("{}/", server.uri()), format!("{}/about", server.uri())]
    );
    assert_eq!(summary.pages_discovered, 2);
    assert_eq!(summary.pages_visited(), 2);
}

#[tokio::test]
async fn test_robots_disallow_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/public">Public</a><a href="/private">Private</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html_page("Public", "<p>Open</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html_page("Private", "<p>Secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let sink = Arc::new(MemoryDiscoverySink::new());
    let coordinator = Coordinator::new(&test_config(), target, sink.clone()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(
        sorted_urls(&sink),
        vec![format!("{}/", server.uri()), format!("{}/public", server.uri())]
    );
    assert_eq!(summary.robots_denied, 1);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", "<p>Hello</p>"))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.obey_robots = false;
    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let sink = Arc::new(MemoryDiscoverySink::new());
    let coordinator = Coordinator::new(&config, target, sink.clone()).unwrap();
    coordinator.run().await.unwrap();

    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn test_external_and_non_html_links_not_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="https://elsewhere.example/">Elsewhere</a>
               <a href="mailto:team@example.com">Mail</a>
               <a href="/report.pdf">Report</a>
               <a href="/docs">Docs</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(html_page("Docs", "<p>Docs</p>"))
        .mount(&server)
        .await;

    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let sink = Arc::new(MemoryDiscoverySink::new());
    let coordinator = Coordinator::new(&test_config(), target, sink.clone()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(
        sorted_urls(&sink),
        vec![format!("{}/", server.uri()), format!("{}/docs", server.uri())]
    );
    assert_eq!(summary.not_html, 1);
}

#[tokio::test]
async fn test_fetch_failures_do_not_stop_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/broken">Broken</a><a href="/fine">Fine</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fine"))
        .respond_with(html_page("Fine", "<p>Fine</p>"))
        .mount(&server)
        .await;

    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let sink = Arc::new(MemoryDiscoverySink::new());
    let coordinator = Coordinator::new(&test_config(), target, sink.clone()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(
        sorted_urls(&sink),
        vec![format!("{}/", server.uri()), format!("{}/fine", server.uri())]
    );
    assert_eq!(summary.fetch_failures, 1);
}

#[tokio::test]
async fn test_max_depth_limits_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/a">A</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", r#"<a href="/a/b">B</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a/b"))
        .respond_with(html_page("B", "<p>Too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.max_depth = Some(1);
    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let sink = Arc::new(MemoryDiscoverySink::new());
    let coordinator = Coordinator::new(&config, target, sink.clone()).unwrap();
    coordinator.run().await.unwrap();

    assert_eq!(
        sorted_urls(&sink),
        vec![format!("{}/", server.uri()), format!("{}/a", server.uri())]
    );
}

#[tokio::test]
async fn test_discovery_file_truncated_on_new_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", "<p>Home</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let file = discovery_path(dir.path(), &target.seed, None);

    crawl(&test_config(), target.clone(), &file).await.unwrap();
    crawl(&test_config(), target, &file).await.unwrap();

    assert_eq!(read_discovery_file(&file).unwrap().len(), 1);
}
