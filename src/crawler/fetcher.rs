//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for both phases, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with bounded redirect following
//! - Error classification
//! - Retry logic with exponential backoff for transient failures

use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Why a fetch failed
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("redirect limit exceeded for {url}")]
    TooManyRedirects { url: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Returns true for failures worth retrying: timeouts, connection
    /// failures, 5xx and 429
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// The HTTP status, when the failure was a status error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_redirect() {
            Self::TooManyRedirects { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub requested_url: Url,

    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body; absent for non-HTML responses, which are not downloaded
    pub body: Option<String>,

    /// Time from sending the request to having the body
    pub latency: Duration,
}

impl FetchResult {
    /// Returns true if the response carried an HTML body
    pub fn is_html(&self) -> bool {
        self.body.is_some()
    }

    /// Returns true if redirects moved the request to another URL
    pub fn was_redirected(&self) -> bool {
        self.requested_url != self.final_url
    }
}

/// Retry behavior for transient fetch failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Cap on the exponential delay
    pub max_delay: Duration,

    /// Growth factor between consecutive retries
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::from_millis(500))
    }

    /// Exponential backoff from `base_delay`, capped at 30 seconds
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.backoff_multiplier.powi(attempt as i32 - 1);
        let millis = (self.base_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Full User-Agent header value
/// * `timeout` - Total request timeout
/// * `max_redirects` - Redirect hops followed before giving up
///
/// # Example
///
/// ```
/// use sitescribe::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("Sitescribe/0.1", Duration::from_secs(20), 10).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
    max_redirects: u32,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(max_redirects as usize))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a Content-Type denotes an HTML document
///
/// A missing header is treated as HTML.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(value) => {
            let mime = value
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
        }
    }
}

/// Fetches a URL once
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, HTML | `Ok` with body |
/// | 2xx, other content type | `Ok` without body |
/// | non-2xx | `Err(Status)` |
/// | Timeout | `Err(Timeout)` |
/// | Connection refused / TLS | `Err(Connect)` |
/// | Redirect chain too long | `Err(TooManyRedirects)` |
pub async fn fetch_url(client: &Client, url: &Url) -> Result<FetchResult, FetchError> {
    let started = Instant::now();

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = if is_html_content_type(content_type.as_deref()) {
        let text = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Some(text)
    } else {
        None
    };

    Ok(FetchResult {
        requested_url: url.clone(),
        final_url,
        status: status.as_u16(),
        content_type,
        body,
        latency: started.elapsed(),
    })
}

/// Fetches a URL, retrying transient failures per `policy`
///
/// Only timeouts, connection failures, 5xx and 429 responses are retried;
/// every other failure is returned immediately.
pub async fn fetch_with_retry(
    client: &Client,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<FetchResult, FetchError> {
    let mut attempt = 0;

    loop {
        match fetch_url(client, url).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    url = %url,
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying fetch after delay"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
