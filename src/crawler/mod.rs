//! Crawler module for domain discovery
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier (work queue and visited set)
//! - Request scheduling, politeness, and autothrottle
//! - HTTP fetching with retry logic
//! - HTML link extraction
//! - Overall crawl coordination
//! - Ctrl-C handling shared by both phases

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod scheduler;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, fetch_url, fetch_with_retry, is_html_content_type, FetchError, FetchResult,
    RetryPolicy,
};
pub use frontier::{Frontier, FrontierEntry, FrontierStats, OfferOutcome};
pub use parser::extract_links;
pub use scheduler::{HostSlot, Scheduler};

use crate::config::{Config, CrawlTarget};
use crate::output::CrawlSummary;
use crate::storage::JsonlDiscoverySink;
use crate::ScribeError;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point of the crawl phase. It will:
/// 1. Create (truncating) the discovery file
/// 2. Build the HTTP client, frontier, and scheduler
/// 3. Crawl the target domain until the frontier is exhausted
/// 4. Stop early on Ctrl-C, keeping the discovery file consistent
/// 5. Flush the discovery file and return the summary
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `target` - Seed URL and allowed domain
/// * `discovery_file` - Where discovery records are written
pub async fn crawl(
    config: &Config,
    target: CrawlTarget,
    discovery_file: &Path,
) -> Result<CrawlSummary, ScribeError> {
    crawl_until(config, target, discovery_file, shutdown_signal()).await
}

/// Runs a complete crawl that stops early once `shutdown` resolves
pub async fn crawl_until<F>(
    config: &Config,
    target: CrawlTarget,
    discovery_file: &Path,
    shutdown: F,
) -> Result<CrawlSummary, ScribeError>
where
    F: Future<Output = ()>,
{
    let sink = Arc::new(JsonlDiscoverySink::create(discovery_file)?);
    tracing::info!(path = %discovery_file.display(), "Writing discovered URLs");

    let coordinator = Coordinator::new(config, target, sink)?;
    coordinator.run_until(shutdown).await
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be installed
///
/// Once installed the handler replaces the default SIGINT termination, so
/// every later phase must listen through a fresh call.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
