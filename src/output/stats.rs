//! Run statistics for both phases
//!
//! Per-URL failures never abort a run; they are counted here and reported at
//! the end instead.

use crate::state::PageOutcome;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by crawl workers
#[derive(Debug, Default)]
pub struct CrawlCounters {
    discovered: AtomicU64,
    duplicate_redirects: AtomicU64,
    out_of_scope: AtomicU64,
    robots_denied: AtomicU64,
    fetch_failed: AtomicU64,
    not_html: AtomicU64,
    sink_failed: AtomicU64,
    links_found: AtomicU64,
    links_rejected: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one finished page by its outcome
    pub fn record_outcome(&self, outcome: PageOutcome) {
        let counter = match outcome {
            PageOutcome::Discovered => &self.discovered,
            PageOutcome::DuplicateRedirect => &self.duplicate_redirects,
            PageOutcome::OutOfScope => &self.out_of_scope,
            PageOutcome::RobotsDenied => &self.robots_denied,
            PageOutcome::FetchFailed => &self.fetch_failed,
            PageOutcome::NotHtml => &self.not_html,
            PageOutcome::SinkFailed => &self.sink_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts links found on a page and how many of them were not enqueued
    pub fn record_links(&self, found: usize, rejected: usize) {
        self.links_found.fetch_add(found as u64, Ordering::Relaxed);
        self.links_rejected
            .fetch_add(rejected as u64, Ordering::Relaxed);
    }

    /// Pages recorded in the discovery sink so far
    pub fn discovered(&self) -> u64 {
        self.discovered.load(Ordering::Relaxed)
    }

    /// Pages finished so far, whatever their outcome
    pub fn pages_processed(&self) -> u64 {
        [
            &self.discovered,
            &self.duplicate_redirects,
            &self.out_of_scope,
            &self.robots_denied,
            &self.fetch_failed,
            &self.not_html,
            &self.sink_failed,
        ]
        .iter()
        .map(|c| c.load(Ordering::Relaxed))
        .sum()
    }

    /// Freezes the counters into a summary
    pub fn summarize(
        &self,
        domain: &str,
        seed: &str,
        started_at: DateTime<Utc>,
        interrupted: bool,
    ) -> CrawlSummary {
        let finished_at = Utc::now();
        CrawlSummary {
            domain: domain.to_string(),
            seed: seed.to_string(),
            started_at,
            finished_at,
            duration_seconds: (finished_at - started_at).num_milliseconds().max(0) as f64
                / 1000.0,
            interrupted,
            pages_discovered: self.discovered.load(Ordering::Relaxed),
            duplicate_redirects: self.duplicate_redirects.load(Ordering::Relaxed),
            out_of_scope: self.out_of_scope.load(Ordering::Relaxed),
            robots_denied: self.robots_denied.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failed.load(Ordering::Relaxed),
            not_html: self.not_html.load(Ordering::Relaxed),
            sink_failures: self.sink_failed.load(Ordering::Relaxed),
            links_found: self.links_found.load(Ordering::Relaxed),
            links_rejected: self.links_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Summary statistics for a crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub domain: String,
    pub seed: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub interrupted: bool,

    // Outcome breakdown
    pub pages_discovered: u64,
    pub duplicate_redirects: u64,
    pub out_of_scope: u64,
    pub robots_denied: u64,
    pub fetch_failures: u64,
    pub not_html: u64,
    pub sink_failures: u64,

    // Link statistics
    pub links_found: u64,
    pub links_rejected: u64,
}

impl CrawlSummary {
    /// Pages that were taken from the frontier
    pub fn pages_visited(&self) -> u64 {
        self.pages_discovered
            + self.duplicate_redirects
            + self.out_of_scope
            + self.robots_denied
            + self.fetch_failures
            + self.not_html
            + self.sink_failures
    }

    /// Pages skipped for scope reasons (redirected away, robots, duplicates)
    pub fn pages_skipped(&self) -> u64 {
        self.duplicate_redirects + self.out_of_scope + self.robots_denied + self.not_html
    }
}

/// Counters for the extraction phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionSummary {
    /// Discovery records processed
    pub total: u64,
    /// Documents written to new paths
    pub documents_written: u64,
    /// Documents that replaced a file written earlier in the same run
    pub documents_overwritten: u64,
    /// Documents skipped because the content was empty
    pub skipped_empty: u64,
    /// Pages whose fetch failed
    pub fetch_failures: u64,
    /// Pages whose HTML could not be processed
    pub parse_failures: u64,
    /// Pages that yielded no main content
    pub no_content: u64,
    /// Documents that could not be persisted
    pub write_failures: u64,
    /// Records never fetched because the run was interrupted
    pub skipped_interrupted: u64,
    /// Whether an interrupt stopped the phase early
    pub interrupted: bool,
    /// Wall-clock time of the phase
    pub duration_seconds: f64,
}

impl ExtractionSummary {
    /// Documents persisted, including overwrites
    pub fn documents_persisted(&self) -> u64 {
        self.documents_written + self.documents_overwritten
    }

    /// Fetch, parse and empty-content failures combined
    pub fn extraction_failures(&self) -> u64 {
        self.fetch_failures + self.parse_failures + self.no_content
    }

    /// Returns true when persistence failed for most documents that had content
    ///
    /// This is the only per-document failure class that changes the exit code.
    pub fn persistence_failed_for_majority(&self) -> bool {
        let attempted = self.documents_persisted() + self.write_failures;
        attempted > 0 && self.write_failures * 2 > attempted
    }
}

/// Prints a crawl summary to stdout
pub fn print_crawl_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Seed: {}", summary.seed);
    println!("  Domain: {}", summary.domain);
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Duration: {:.1}s", summary.duration_seconds);
    if summary.interrupted {
        println!("  Status: interrupted");
    }
    println!();

    println!("Pages:");
    println!("  Visited: {}", summary.pages_visited());
    println!("  Discovered: {}", summary.pages_discovered);
    println!("  Skipped: {}", summary.pages_skipped());
    println!("  Fetch failures: {}", summary.fetch_failures);
    if summary.sink_failures > 0 {
        println!("  Not recorded (write errors): {}", summary.sink_failures);
    }
    println!();

    println!("Links:");
    println!("  Found: {}", summary.links_found);
    println!("  Not followed: {}", summary.links_rejected);
}

/// Prints an extraction summary to stdout
pub fn print_extraction_summary(summary: &ExtractionSummary) {
    println!("=== Extraction Summary ===\n");
    println!("  URLs processed: {}", summary.total);
    println!("  Documents written: {}", summary.documents_persisted());
    if summary.documents_overwritten > 0 {
        println!(
            "  Overwritten by name collision: {}",
            summary.documents_overwritten
        );
    }
    println!("  Skipped (empty content): {}", summary.skipped_empty);
    println!("  Extraction failures: {}", summary.extraction_failures());
    println!("    fetch: {}", summary.fetch_failures);
    println!("    parse: {}", summary.parse_failures);
    println!("    no content: {}", summary.no_content);
    println!("  Write failures: {}", summary.write_failures);
    if summary.interrupted {
        println!("  Not fetched (interrupted): {}", summary.skipped_interrupted);
    }
    println!("  Duration: {:.1}s", summary.duration_seconds);
}
