//! Extraction worker pool
//!
//! Discovery records are processed with bounded concurrency. Fetches go
//! through the same per-host scheduler as the crawl, so the extraction phase
//! is just as polite. Documents are handed to the sink one at a time as they
//! complete.

use crate::config::{Config, ExtractionConfig};
use crate::crawler::{build_http_client, fetch_with_retry, FetchError, RetryPolicy, Scheduler};
use crate::extract::{
    extract_main_content, extract_title, ExtractedDocument, ExtractionFailure,
};
use crate::output::{domain_dir_name, DocumentSink, ExtractionSummary, WriteOutcome};
use crate::storage::DiscoveryRecord;
use crate::ScribeError;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Fetches single pages and turns them into documents
pub struct PageExtractor {
    client: Client,
    config: ExtractionConfig,
    retry: RetryPolicy,
    scheduler: Arc<Scheduler>,
}

impl PageExtractor {
    /// Creates an extractor from the run configuration
    ///
    /// The extraction user agent override is used when set, otherwise the
    /// crawler's user agent.
    ///
    /// # Returns
    ///
    /// * `Ok(PageExtractor)` - Ready to extract
    /// * `Err(ScribeError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, ScribeError> {
        let extraction = &config.extraction;
        let user_agent = extraction
            .user_agent
            .clone()
            .unwrap_or_else(|| config.user_agent.header_value());
        let client = build_http_client(
            &user_agent,
            extraction.request_timeout(),
            config.crawler.max_redirects,
        )?;

        let scheduler = Arc::new(Scheduler::new(
            config.politeness.clone(),
            extraction.concurrency,
            config
                .crawler
                .per_host_concurrency
                .min(extraction.concurrency),
        ));
        let retry = RetryPolicy::new(
            config.crawler.max_retries,
            Duration::from_millis(config.crawler.retry_backoff_ms),
        );

        tracing::debug!(user_agent = %user_agent, "Built extraction HTTP client");

        Ok(Self {
            client,
            config: extraction.clone(),
            retry,
            scheduler,
        })
    }

    /// Fetches and extracts one page
    ///
    /// Never fails: fetch errors, non-HTML responses and pages without main
    /// content all come back as a document with a failure set.
    pub async fn extract(&self, url: &str) -> ExtractedDocument {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(url = url, error = %e, "Unparsable URL in discovery file");
                let failure = FetchError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                };
                return ExtractedDocument::failed(url, "", failure.into());
            }
        };
        let domain = domain_dir_name(&parsed);
        let host = parsed.host_str().unwrap_or_default().to_string();

        let Some(slot) = self.scheduler.acquire(&host).await else {
            let failure = FetchError::Request {
                url: url.to_string(),
                message: "scheduler shut down".to_string(),
            };
            return ExtractedDocument::failed(url, domain, failure.into());
        };
        let requested_at = Instant::now();
        let result = fetch_with_retry(&self.client, &parsed, &self.retry).await;
        match &result {
            Ok(fetched) => self.scheduler.release(slot, fetched.latency, true),
            Err(_) => self.scheduler.release(slot, requested_at.elapsed(), false),
        }

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(url = url, error = %e, "Fetch failed");
                return ExtractedDocument::failed(url, domain, e.into());
            }
        };

        let Some(html) = fetched.body else {
            tracing::debug!(
                url = url,
                content_type = fetched.content_type.as_deref().unwrap_or(""),
                "Skipping non-HTML response"
            );
            return ExtractedDocument::failed(url, domain, ExtractionFailure::NoContent);
        };

        self.extract_html(url, &domain, html).await
    }

    /// Extracts title and main content from markup already in hand
    ///
    /// Parsing runs on the blocking pool; a panic there becomes a
    /// [`ExtractionFailure::Parse`] for this page only.
    pub async fn extract_html(&self, url: &str, domain: &str, html: String) -> ExtractedDocument {
        let config = self.config.clone();
        let parsed = tokio::task::spawn_blocking(move || {
            let title = extract_title(&html);
            extract_main_content(&html, &config).map(|content| (title, content))
        })
        .await;

        match parsed {
            Ok(Ok((title, content))) => {
                let doc = ExtractedDocument::new(url, domain, title, content);
                if !doc.has_content() {
                    tracing::debug!(url = url, "No main content found");
                }
                doc
            }
            Ok(Err(e)) => {
                tracing::warn!(url = url, error = %e, "Markdown conversion failed");
                ExtractedDocument::failed(url, domain, ExtractionFailure::Parse(e.to_string()))
            }
            Err(e) => {
                tracing::error!(url = url, error = %e, "Extraction task failed");
                ExtractedDocument::failed(url, domain, ExtractionFailure::Parse(e.to_string()))
            }
        }
    }
}

/// Runs the extraction phase over a list of discovery records
pub struct ExtractionPipeline {
    extractor: PageExtractor,
    concurrency: usize,
}

impl ExtractionPipeline {
    /// Creates a pipeline from the run configuration
    pub fn new(config: &Config) -> Result<Self, ScribeError> {
        Ok(Self {
            extractor: PageExtractor::new(config)?,
            concurrency: config.extraction.concurrency.max(1) as usize,
        })
    }

    /// The extractor used for each record
    pub fn extractor(&self) -> &PageExtractor {
        &self.extractor
    }

    /// Extracts every record and hands the documents to `sink`
    pub async fn run(
        &self,
        records: Vec<DiscoveryRecord>,
        sink: &dyn DocumentSink,
    ) -> ExtractionSummary {
        self.run_until(records, sink, std::future::pending()).await
    }

    /// Extracts records until all are done or `shutdown` resolves
    ///
    /// Up to `concurrency` pages are in flight at once. Per-page failures and
    /// write failures are counted, never propagated. After shutdown no new
    /// fetch is started; pages already in flight are still written.
    ///
    /// # Arguments
    ///
    /// * `records` - Discovery records, in file order
    /// * `sink` - Destination of the documents
    /// * `shutdown` - Resolves when the operator interrupts the run
    ///
    /// # Returns
    ///
    /// Counters for the whole phase
    pub async fn run_until<F>(
        &self,
        records: Vec<DiscoveryRecord>,
        sink: &dyn DocumentSink,
        shutdown: F,
    ) -> ExtractionSummary
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut summary = ExtractionSummary {
            total: records.len() as u64,
            ..Default::default()
        };

        tracing::info!(
            urls = records.len(),
            workers = self.concurrency,
            "Starting extraction"
        );

        let extractor = &self.extractor;
        let stopped = AtomicBool::new(false);
        let stopped = &stopped;
        let mut documents = stream::iter(records.into_iter().enumerate())
            .map(|(index, record)| async move {
                if stopped.load(Ordering::Acquire) {
                    return None;
                }
                let doc = extractor.extract(&record.url).await;
                Some((index, doc))
            })
            .buffer_unordered(self.concurrency);

        tokio::pin!(shutdown);
        let mut processed = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown, if !summary.interrupted => {
                    tracing::warn!("Interrupt received, finishing in-flight pages");
                    summary.interrupted = true;
                    stopped.store(true, Ordering::Release);
                    continue;
                }
                next = documents.next() => next,
            };
            let (index, doc) = match next {
                Some(Some(done)) => done,
                Some(None) => {
                    summary.skipped_interrupted += 1;
                    continue;
                }
                None => break,
            };
            processed += 1;

            match &doc.failure {
                Some(ExtractionFailure::Fetch(_)) => summary.fetch_failures += 1,
                Some(ExtractionFailure::Parse(_)) => summary.parse_failures += 1,
                Some(ExtractionFailure::NoContent) => summary.no_content += 1,
                None => {}
            }

            match sink.write(&doc, index) {
                Ok(WriteOutcome::Written(_)) => summary.documents_written += 1,
                Ok(WriteOutcome::Overwrote { .. }) => summary.documents_overwritten += 1,
                Ok(WriteOutcome::SkippedEmpty) => summary.skipped_empty += 1,
                Err(e) => {
                    tracing::error!(url = %doc.url, error = %e, "Failed to save document");
                    summary.write_failures += 1;
                }
            }

            if processed % 10 == 0 {
                tracing::info!(
                    processed,
                    total = summary.total,
                    written = summary.documents_persisted(),
                    "Extraction progress"
                );
            }
        }

        summary.duration_seconds = started.elapsed().as_secs_f64();

        tracing::info!(
            written = summary.documents_persisted(),
            failures = summary.extraction_failures(),
            write_failures = summary.write_failures,
            interrupted = summary.interrupted,
            duration_secs = summary.duration_seconds,
            "Extraction completed"
        );

        summary
    }
}
