//! Integration tests for sitescribe
//!
//! These tests use wiremock to create mock HTTP servers and run the crawl
//! and extraction phases end-to-end against temporary directories.

mod crawl_tests;
mod extract_tests;

use sitescribe::config::Config;
use wiremock::ResponseTemplate;

/// Configuration with politeness delays disabled
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.concurrency = 4;
    config.crawler.per_host_concurrency = 2;
    config.crawler.request_timeout_secs = 5;
    config.politeness.delay_ms = 0;
    config.politeness.autothrottle = false;
    config.extraction.concurrency = 2;
    config.extraction.request_timeout_secs = 5;
    config
}

/// An HTML page with the given title and body
pub fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(
            format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                title, body
            ),
            "text/html; charset=utf-8",
        )
}
