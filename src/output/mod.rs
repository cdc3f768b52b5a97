//! Output module for documents and run reports
//!
//! This module handles:
//! - Rendering extracted pages as Markdown with front matter
//! - Writing documents under per-domain directories
//! - Recording run statistics and printing end-of-run summaries

mod markdown;
pub mod stats;
mod traits;
mod writer;

pub use markdown::render_document;
pub use stats::{
    print_crawl_summary, print_extraction_summary, CrawlCounters, CrawlSummary,
    ExtractionSummary,
};
pub use traits::{DocumentSink, OutputError, OutputResult, WriteOutcome};
pub use writer::{derive_document_name, domain_dir_name, DocumentWriter};
