//! Extraction phase tests
//!
//! Documents are written to temporary directories and checked on disk.

use crate::{html_page, test_config};
use sitescribe::config::CrawlTarget;
use sitescribe::crawler::crawl;
use sitescribe::extract::ExtractionPipeline;
use sitescribe::output::DocumentWriter;
use sitescribe::storage::{discovery_path, read_discovery_file, DiscoveryRecord};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Directory the documents of a mock server land in
fn domain_dir(root: &TempDir, server: &MockServer) -> PathBuf {
    let url = url::Url::parse(&server.uri()).unwrap();
    let port = url.port().unwrap();
    root.path().join(format!("127.0.0.1_{}", port))
}

#[tokio::test]
async fn test_crawl_then_extract() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Welcome",
            r#"<nav><a href="/about">About</a></nav>
               <main><h1>Welcome</h1><p>This is the home page of the test site.</p></main>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page(
            "About us",
            r#"<nav><a href="/">Home</a></nav>
               <article><h1>About</h1><p>We build small, careful tools.</p></article>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config();
    let work = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();

    let target = CrawlTarget::from_seed(&server.uri(), None).unwrap();
    let file = discovery_path(work.path(), &target.seed, None);
    crawl(&config, target, &file).await.unwrap();

    let lines = fs::read_to_string(&file).unwrap();
    assert_eq!(lines.lines().count(), 2);

    let records = read_discovery_file(&file).unwrap();
    let pipeline = ExtractionPipeline::new(&config).unwrap();
    let writer = DocumentWriter::new(docs.path());
    let summary = pipeline.run(records, &writer).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.documents_written, 2);
    assert_eq!(summary.extraction_failures(), 0);

    let dir = domain_dir(&docs, &server);
    let index = fs::read_to_string(dir.join("index.md")).unwrap();
    assert!(index.starts_with(&format!(
        "---\nsite_url: \"{}/\"\ntitle: \"Welcome\"\n---\n\n",
        server.uri()
    )));
    assert!(index.contains("This is the home page of the test site."));
    assert!(!index.contains("About"));

    let about = fs::read_to_string(dir.join("about.md")).unwrap();
    assert!(about.contains("title: \"About us\""));
    assert!(about.contains("We build small, careful tools."));
    assert!(!about.contains("Home"));
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let pipeline = ExtractionPipeline::new(&test_config()).unwrap();
    let writer = DocumentWriter::new(docs.path());

    let records = vec![DiscoveryRecord::new(format!("{}/gone", server.uri()))];
    let summary = pipeline.run(records, &writer).await;

    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.documents_persisted(), 0);
    assert_eq!(summary.skipped_empty, 1);
    assert!(!domain_dir(&docs, &server).join("gone.md").exists());
}

#[tokio::test]
async fn test_page_without_content_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(html_page("Blank", "<script>render()</script>"))
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let pipeline = ExtractionPipeline::new(&test_config()).unwrap();
    let writer = DocumentWriter::new(docs.path());

    let records = vec![DiscoveryRecord::new(format!("{}/blank", server.uri()))];
    let summary = pipeline.run(records, &writer).await;

    assert_eq!(summary.no_content, 1);
    assert_eq!(summary.documents_persisted(), 0);
    assert!(!domain_dir(&docs, &server).join("blank.md").exists());
}

#[tokio::test]
async fn test_basename_collision_overwrites() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blog/intro"))
        .respond_with(html_page("Blog", "<article><p>Blog introduction text.</p></article>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html_page("Docs", "<article><p>Docs introduction text.</p></article>"))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.extraction.concurrency = 1;

    let docs = TempDir::new().unwrap();
    let pipeline = ExtractionPipeline::new(&config).unwrap();
    let writer = DocumentWriter::new(docs.path());

    let records = vec![
        DiscoveryRecord::new(format!("{}/blog/intro", server.uri())),
        DiscoveryRecord::new(format!("{}/docs/intro", server.uri())),
    ];
    let summary = pipeline.run(records, &writer).await;

    assert_eq!(summary.documents_written, 1);
    assert_eq!(summary.documents_overwritten, 1);

    let entries = fs::read_dir(domain_dir(&docs, &server)).unwrap().count();
    assert_eq!(entries, 1);

    let intro = fs::read_to_string(domain_dir(&docs, &server).join("intro.md")).unwrap();
    assert!(intro.contains("Docs introduction text."));
}

#[tokio::test]
async fn test_unwritable_output_counts_write_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html_page("Page", "<p>Some content.</p>"))
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let blocker = docs.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let pipeline = ExtractionPipeline::new(&test_config()).unwrap();
    let writer = DocumentWriter::new(&blocker);

    let records = vec![DiscoveryRecord::new(format!("{}/page", server.uri()))];
    let summary = pipeline.run(records, &writer).await;

    assert_eq!(summary.write_failures, 1);
    assert!(summary.persistence_failed_for_majority());
}
