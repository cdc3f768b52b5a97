//! State module for tracking crawl progress
//!
//! This module provides state management for pages and hosts during the crawl process.
//!
//! # Components
//!
//! - `PageState`: Lifecycle of a canonical URL inside the frontier (unseen, queued, in flight, done)
//! - `PageOutcome`: Why a page reached the done state
//! - `DomainState`: Per-host politeness bookkeeping (concurrency, delay, autothrottle)

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::DomainState;
pub use page_state::{PageOutcome, PageState};
