//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier
//! - Running the worker pool over the shared frontier
//! - Coordinating robots checks, fetching, and link extraction
//! - Recording confirmed URLs in the discovery sink
//! - Handling interrupts

use crate::config::{Config, CrawlTarget};
use crate::crawler::fetcher::{build_http_client, fetch_with_retry, RetryPolicy};
use crate::crawler::frontier::{Frontier, FrontierEntry, OfferOutcome};
use crate::crawler::parser::extract_links;
use crate::crawler::scheduler::Scheduler;
use crate::output::{CrawlCounters, CrawlSummary};
use crate::robots::RobotsCache;
use crate::state::PageOutcome;
use crate::storage::{DiscoveryRecord, DiscoverySink};
use crate::url::normalize_url;
use crate::ScribeError;
use chrono::Utc;
use futures::FutureExt;
use reqwest::Client;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    target: CrawlTarget,
    concurrency: u32,
    worker: Worker,
}

/// Everything one crawl worker needs; cheap to clone
#[derive(Clone)]
struct Worker {
    frontier: Arc<Frontier>,
    scheduler: Arc<Scheduler>,
    robots: Arc<RobotsCache>,
    sink: Arc<dyn DiscoverySink>,
    counters: Arc<CrawlCounters>,
    client: Client,
    retry: RetryPolicy,
    obey_robots: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `target` - Seed URL and allowed domain
    /// * `sink` - Destination of discovery records
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScribeError)` - The HTTP client could not be built
    pub fn new(
        config: &Config,
        target: CrawlTarget,
        sink: Arc<dyn DiscoverySink>,
    ) -> Result<Self, ScribeError> {
        let crawler = &config.crawler;
        let user_agent = config.user_agent.header_value();
        let client =
            build_http_client(&user_agent, crawler.request_timeout(), crawler.max_redirects)?;

        let frontier = Arc::new(Frontier::new(
            target.domain.clone(),
            crawler.max_depth,
            crawler.max_pages,
        ));
        let scheduler = Arc::new(Scheduler::new(
            config.politeness.clone(),
            crawler.concurrency,
            crawler.per_host_concurrency,
        ));
        let robots = Arc::new(RobotsCache::new(
            client.clone(),
            config.user_agent.crawler_name.clone(),
            crawler.obey_robots,
        ));
        let retry = RetryPolicy::new(
            crawler.max_retries,
            std::time::Duration::from_millis(crawler.retry_backoff_ms),
        );

        tracing::debug!(user_agent = %user_agent, "Built crawl HTTP client");

        Ok(Self {
            target,
            concurrency: crawler.concurrency,
            worker: Worker {
                frontier,
                scheduler,
                robots,
                sink,
                counters: Arc::new(CrawlCounters::new()),
                client,
                retry,
                obey_robots: crawler.obey_robots,
            },
        })
    }

    /// The shared frontier; closing it stops the crawl
    pub fn frontier(&self) -> Arc<Frontier> {
        Arc::clone(&self.worker.frontier)
    }

    /// Runs the crawl until the frontier is exhausted
    pub async fn run(&self) -> Result<CrawlSummary, ScribeError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until the frontier is exhausted or `shutdown` resolves
    ///
    /// On shutdown no new fetches are issued; in-flight pages finish (or time
    /// out) and the discovery sink is flushed before returning.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<CrawlSummary, ScribeError>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let frontier = &self.worker.frontier;

        tracing::info!(
            seed = %self.target.seed,
            domain = %self.target.domain,
            workers = self.concurrency,
            "Starting crawl"
        );

        match frontier.offer(self.target.seed.clone(), 0) {
            OfferOutcome::Enqueued => {}
            outcome => {
                tracing::warn!(
                    seed = %self.target.seed,
                    domain = %self.target.domain,
                    ?outcome,
                    "Seed URL was not accepted; nothing to crawl"
                );
            }
        }

        let mut workers = JoinSet::new();
        for id in 0..self.concurrency {
            let worker = self.worker.clone();
            workers.spawn(async move { worker.run(id).await });
        }

        tokio::pin!(shutdown);
        let mut interrupted = false;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown, if !interrupted => {
                    tracing::warn!("Interrupt received, finishing in-flight pages");
                    interrupted = true;
                    frontier.close();
                }
                joined = workers.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => tracing::error!(error = %e, "Crawl worker failed"),
                    None => break,
                },
            }
        }

        self.worker.sink.flush()?;

        let summary = self.worker.counters.summarize(
            &self.target.domain,
            self.target.seed.as_str(),
            started_at,
            interrupted,
        );

        tracing::info!(
            discovered = summary.pages_discovered,
            visited = summary.pages_visited(),
            fetch_failures = summary.fetch_failures,
            duration_secs = summary.duration_seconds,
            "Crawl completed"
        );

        Ok(summary)
    }
}

impl Worker {
    async fn run(self, id: u32) {
        tracing::trace!(worker = id, "Crawl worker started");

        while let Some(entry) = self.frontier.take().await {
            // A panicking page must still be completed or `take` never terminates
            let outcome = match AssertUnwindSafe(self.process(&entry)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(worker = id, url = %entry.url, "Processing the page panicked");
                    PageOutcome::FetchFailed
                }
            };
            self.counters.record_outcome(outcome);

            if let Err(e) = self.frontier.complete(&entry.url, outcome) {
                tracing::error!(url = %entry.url, error = %e, "Frontier bookkeeping failed");
            }

            let processed = self.counters.pages_processed();
            if processed % 10 == 0 {
                let stats = self.frontier.stats();
                tracing::info!(
                    processed,
                    discovered = self.counters.discovered(),
                    queued = stats.queued,
                    in_flight = stats.in_flight,
                    "Crawl progress"
                );
            }
        }

        tracing::trace!(worker = id, "Crawl worker finished");
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Checks robots.txt
    /// 2. Waits for a politeness slot and fetches the page
    /// 3. Re-checks scope on the final URL after redirects
    /// 4. Records the URL in the discovery sink
    /// 5. Extracts links and offers them to the frontier
    async fn process(&self, entry: &FrontierEntry) -> PageOutcome {
        let url = entry.url.as_url();
        let host = entry.url.host().unwrap_or_default().to_string();

        if self.obey_robots {
            if !self.robots.is_allowed(url).await {
                tracing::info!(url = %url, "Disallowed by robots.txt");
                return PageOutcome::RobotsDenied;
            }
            if let Some(delay) = self.robots.crawl_delay(url).await {
                self.scheduler.apply_crawl_delay(&host, delay);
            }
        }

        let Some(slot) = self.scheduler.acquire(&host).await else {
            return PageOutcome::FetchFailed;
        };
        let requested_at = Instant::now();
        let result = fetch_with_retry(&self.client, url, &self.retry).await;
        match &result {
            Ok(fetched) => self.scheduler.release(slot, fetched.latency, true),
            Err(_) => self.scheduler.release(slot, requested_at.elapsed(), false),
        }

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Fetch failed");
                return PageOutcome::FetchFailed;
            }
        };

        let final_url = match normalize_url(fetched.final_url.as_str()) {
            Ok(final_url) => final_url,
            Err(e) => {
                tracing::debug!(url = %fetched.final_url, error = %e, "Redirected to unusable URL");
                return PageOutcome::OutOfScope;
            }
        };

        if final_url != entry.url {
            if !final_url.is_in_scope(self.frontier.domain()) {
                tracing::debug!(url = %url, landed = %final_url, "Redirected out of scope");
                return PageOutcome::OutOfScope;
            }
            if !self.frontier.claim_redirect_target(&final_url) {
                tracing::debug!(url = %url, landed = %final_url, "Redirected to a known URL");
                return PageOutcome::DuplicateRedirect;
            }
        }

        let Some(body) = fetched.body else {
            tracing::debug!(
                url = %final_url,
                content_type = fetched.content_type.as_deref().unwrap_or(""),
                "Skipping non-HTML response"
            );
            return PageOutcome::NotHtml;
        };

        let mut outcome = PageOutcome::Discovered;
        if let Err(e) = self.sink.record(&DiscoveryRecord::from(&final_url)) {
            tracing::error!(url = %final_url, error = %e, "Failed to record discovered URL");
            outcome = PageOutcome::SinkFailed;
        } else {
            tracing::debug!(url = %final_url, depth = entry.depth, "Discovered");
        }

        let base = fetched.final_url;
        let links = match tokio::task::spawn_blocking(move || extract_links(&body, &base)).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!(url = %final_url, error = %e, "Link extraction failed");
                Vec::new()
            }
        };
        let found = links.len();
        let mut enqueued = 0;
        for link in links {
            if self.frontier.offer(link, entry.depth + 1).is_enqueued() {
                enqueued += 1;
            }
        }
        self.counters.record_links(found, found - enqueued);

        tracing::trace!(url = %final_url, found, enqueued, "Links processed");
        outcome
    }
}
