//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. A URL disallowed for the crawler's product token is never
//! fetched.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Builds the robots.txt URL for the origin of `url`
///
/// # Returns
///
/// `<scheme>://<host>[:port]/robots.txt`, or None for URLs without a host
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    Some(robots)
}

/// Fetches and parses a robots.txt file
///
/// Never fails: a 4xx/5xx status, a network error, or an unreadable body all
/// degrade to allow-all, which is logged.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `robots_url` - Location of the robots.txt file
pub async fn fetch_robots(client: &Client, robots_url: &Url) -> ParsedRobots {
    let response = match client.get(robots_url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %robots_url, error = %e, "robots.txt unreachable, allowing all");
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(url = %robots_url, status = status.as_u16(), "No robots.txt, allowing all");
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!(url = %robots_url, bytes = body.len(), "Fetched robots.txt");
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::warn!(url = %robots_url, error = %e, "Failed to read robots.txt, allowing all");
            ParsedRobots::allow_all()
        }
    }
}
