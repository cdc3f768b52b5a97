//! Session-scoped robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per crawl session.
//! Concurrent workers asking for the same origin wait on the same fetch.

use crate::robots::{fetch_robots, robots_url, ParsedRobots};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

type RobotsSlot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Per-origin robots.txt cache shared by all crawl workers
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    product_token: String,
    enabled: bool,
    entries: Mutex<HashMap<String, RobotsSlot>>,
}

impl RobotsCache {
    /// Creates a new cache
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `product_token` - Token matched against `User-agent` groups
    /// * `enabled` - When false every URL is allowed and nothing is fetched
    pub fn new(client: Client, product_token: impl Into<String>, enabled: bool) -> Self {
        Self {
            client,
            product_token: product_token.into(),
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The product token used for matching
    pub fn product_token(&self) -> &str {
        &self.product_token
    }

    /// Returns the robots.txt rules for the origin of `url`, fetching them once
    pub async fn rules_for(&self, url: &Url) -> Arc<ParsedRobots> {
        if !self.enabled {
            return Arc::new(ParsedRobots::allow_all());
        }

        let Some(robots) = robots_url(url) else {
            return Arc::new(ParsedRobots::allow_all());
        };

        let key = url.origin().ascii_serialization();
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(key).or_default().clone()
        };

        slot.get_or_init(|| async {
            Arc::new(fetch_robots(&self.client, &robots).await)
        })
        .await
        .clone()
    }

    /// Checks whether `url` may be fetched
    pub async fn is_allowed(&self, url: &Url) -> bool {
        self.rules_for(url)
            .await
            .is_allowed(url.as_str(), &self.product_token)
    }

    /// The Crawl-delay (seconds) advertised for the origin of `url`, if any
    pub async fn crawl_delay(&self, url: &Url) -> Option<f64> {
        self.rules_for(url).await.crawl_delay(&self.product_token)
    }

    /// Number of origins whose robots.txt has been requested
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no robots.txt has been requested yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
