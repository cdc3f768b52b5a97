use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitescribe
///
/// Every section has defaults, so an empty TOML document (or no file at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl-phase behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent crawl workers
    pub concurrency: u32,

    /// Maximum number of concurrent requests to a single host
    #[serde(rename = "per-host-concurrency")]
    pub per_host_concurrency: u32,

    /// Request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// Retries after the first attempt (0 disables retrying)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Whether robots.txt rules are honored
    #[serde(rename = "obey-robots")]
    pub obey_robots: bool,

    /// Maximum link depth from the seed (unbounded when absent)
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Maximum number of pages accepted into the frontier (unbounded when absent)
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            per_host_concurrency: 4,
            request_timeout_secs: 20,
            max_redirects: 10,
            max_retries: 0,
            retry_backoff_ms: 500,
            obey_robots: true,
            max_depth: None,
            max_pages: None,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Per-host politeness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    /// Minimum delay between requests to the same host (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Whether the delay adapts to observed response latencies
    pub autothrottle: bool,

    /// Initial delay used when autothrottle is enabled (milliseconds)
    #[serde(rename = "autothrottle-start-delay-ms")]
    pub autothrottle_start_delay_ms: u64,

    /// Ceiling for the adaptive delay (milliseconds)
    #[serde(rename = "autothrottle-max-delay-ms")]
    pub autothrottle_max_delay_ms: u64,

    /// Average number of requests autothrottle aims to keep in flight per host
    #[serde(rename = "autothrottle-target-concurrency")]
    pub autothrottle_target_concurrency: f64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            autothrottle: true,
            autothrottle_start_delay_ms: 5_000,
            autothrottle_max_delay_ms: 60_000,
            autothrottle_target_concurrency: 1.0,
        }
    }
}

impl PolitenessConfig {
    /// The floor of the politeness delay
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// The ceiling of the politeness delay
    pub fn max_delay(&self) -> Duration {
        if self.autothrottle {
            Duration::from_millis(self.autothrottle_max_delay_ms.max(self.delay_ms))
        } else {
            self.min_delay()
        }
    }

    /// The largest robots.txt Crawl-delay that is honored
    ///
    /// Applies whether or not autothrottle is enabled.
    pub fn robots_delay_cap(&self) -> Duration {
        Duration::from_millis(self.autothrottle_max_delay_ms.max(self.delay_ms))
    }

    /// The delay applied to a host before any latency has been observed
    pub fn initial_delay(&self) -> Duration {
        if self.autothrottle {
            Duration::from_millis(self.autothrottle_start_delay_ms.max(self.delay_ms))
                .min(self.max_delay())
        } else {
            self.min_delay()
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the product token matched against robots.txt
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Sitescribe".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the full user agent header: `Name/Version (+contact)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Which way the boilerplate-removal heuristic leans on borderline blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionFavor {
    /// Keep borderline blocks rather than risk dropping content
    #[default]
    Recall,
    /// Drop borderline blocks rather than risk keeping boilerplate
    Precision,
}

/// Extraction-phase configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of pages extracted concurrently
    pub concurrency: u32,

    /// Recall/precision trade-off of the content heuristic
    pub favor: ExtractionFavor,

    /// Keep tables in the extracted content
    #[serde(rename = "include-tables")]
    pub include_tables: bool,

    /// Keep images in the extracted content
    #[serde(rename = "include-images")]
    pub include_images: bool,

    /// Keep user comment sections in the extracted content
    #[serde(rename = "include-comments")]
    pub include_comments: bool,

    /// Keep hyperlinks (otherwise only their text is kept)
    #[serde(rename = "include-links")]
    pub include_links: bool,

    /// Drop repeated paragraphs
    pub deduplicate: bool,

    /// Extractions shorter than this many characters count as empty
    #[serde(rename = "min-content-chars")]
    pub min_content_chars: usize,

    /// Request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Optional user agent override for the extraction phase
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            favor: ExtractionFavor::Recall,
            include_tables: true,
            include_images: false,
            include_comments: false,
            include_links: false,
            deduplicate: true,
            min_content_chars: 1,
            request_timeout_secs: 20,
            user_agent: None,
        }
    }
}

impl ExtractionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding the discovery files
    #[serde(rename = "discovery-dir")]
    pub discovery_dir: String,

    /// Root directory of the extracted documents
    #[serde(rename = "documents-dir")]
    pub documents_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            discovery_dir: "url_lists".to_string(),
            documents_dir: "output_folder".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_header_with_contact() {
        let ua = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/bot".to_string()),
        };
        assert_eq!(ua.header_value(), "TestBot/1.0 (+https://example.com/bot)");
    }

    #[test]
    fn test_initial_delay_respects_bounds() {
        let mut politeness = PolitenessConfig::default();
        assert_eq!(politeness.initial_delay(), Duration::from_secs(5));

        politeness.autothrottle = false;
        assert_eq!(politeness.initial_delay(), Duration::from_millis(500));
        assert_eq!(politeness.max_delay(), Duration::from_millis(500));

        politeness.autothrottle = true;
        politeness.autothrottle_max_delay_ms = 1_000;
        assert_eq!(politeness.initial_delay(), Duration::from_secs(1));
    }
}
