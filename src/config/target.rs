use crate::config::validation::validate_domain_string;
use crate::url::{normalize_url, strip_www, CanonicalUrl};
use crate::ConfigError;

/// The resolved crawl target: where to start and which domain is in scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Canonical seed URL
    pub seed: CanonicalUrl,

    /// Allowed domain (lowercase, without a `www.` prefix)
    pub domain: String,
}

impl CrawlTarget {
    /// Resolves the seed URL and the allowed domain
    ///
    /// When `domain_override` is absent the domain is derived from the seed's
    /// host. Failure here is fatal: nothing is crawled.
    ///
    /// # Example
    ///
    /// ```
    /// use sitescribe::config::CrawlTarget;
    ///
    /// let target = CrawlTarget::from_seed("https://www.Example.com/docs", None).unwrap();
    /// assert_eq!(target.domain, "example.com");
    /// assert_eq!(target.seed.as_str(), "https://www.example.com/docs");
    /// ```
    pub fn from_seed(seed: &str, domain_override: Option<&str>) -> Result<Self, ConfigError> {
        let seed = normalize_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", seed, e)))?;

        let domain = match domain_override {
            Some(domain) => strip_www(domain.trim().trim_end_matches('.')).to_lowercase(),
            None => {
                let host = seed.host().ok_or_else(|| {
                    ConfigError::InvalidDomain(format!(
                        "Could not derive a domain from {}",
                        seed
                    ))
                })?;
                strip_www(host).to_string()
            }
        };

        validate_domain_string(&domain)?;

        Ok(Self { seed, domain })
    }

    /// Whether the seed itself is inside the allowed domain
    pub fn seed_in_scope(&self) -> bool {
        self.seed.is_in_scope(&self.domain)
    }
}
