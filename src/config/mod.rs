//! Configuration module for Sitescribe
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving the crawl target (seed URL and allowed domain).
//!
//! # Example
//!
//! ```no_run
//! use sitescribe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitescribe.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.concurrency);
//! ```

mod parser;
mod target;
mod types;
mod validation;

// Re-export types
pub use target::CrawlTarget;
pub use types::{
    Config, CrawlerConfig, ExtractionConfig, ExtractionFavor, OutputConfig, PolitenessConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
