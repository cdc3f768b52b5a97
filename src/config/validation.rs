use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, PolitenessConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

impl Config {
    /// Validates the entire configuration
    ///
    /// Called by the loaders; configurations assembled in code should call it
    /// before being handed to the crawler.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_crawler_config(&self.crawler)?;
        validate_politeness_config(&self.politeness)?;
        validate_user_agent_config(&self.user_agent)?;
        validate_extraction_config(&self.extraction)?;
        validate_output_config(&self.output)?;
        Ok(())
    }
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 256 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 256, got {}",
            config.concurrency
        )));
    }

    if config.per_host_concurrency < 1 || config.per_host_concurrency > config.concurrency {
        return Err(ConfigError::Validation(format!(
            "per_host_concurrency must be between 1 and concurrency ({}), got {}",
            config.concurrency, config.per_host_concurrency
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_redirects > 50 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 50, got {}",
            config.max_redirects
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates politeness configuration
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.autothrottle {
        if config.autothrottle_max_delay_ms < config.delay_ms {
            return Err(ConfigError::Validation(format!(
                "autothrottle_max_delay_ms ({}) must be >= delay_ms ({})",
                config.autothrottle_max_delay_ms, config.delay_ms
            )));
        }

        let target = config.autothrottle_target_concurrency;
        if target.is_nan() || target <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "autothrottle_target_concurrency must be > 0, got {}",
                config.autothrottle_target_concurrency
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only letters, digits, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates extraction configuration
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 256 {
        return Err(ConfigError::Validation(format!(
            "extraction concurrency must be between 1 and 256, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "extraction request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extraction user_agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.discovery_dir.is_empty() {
        return Err(ConfigError::Validation(
            "discovery_dir cannot be empty".to_string(),
        ));
    }

    if config.documents_dir.is_empty() {
        return Err(ConfigError::Validation(
            "documents_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a bare domain name used as the crawl scope
pub(crate) fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_per_host_concurrency_bounded_by_global() {
        let mut config = Config::default();
        config.crawler.concurrency = 2;
        config.crawler.per_host_concurrency = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_delay_floor_above_ceiling_rejected() {
        let mut config = Config::default();
        config.politeness.delay_ms = 10_000;
        config.politeness.autothrottle_max_delay_ms = 1_000;
        assert!(config.validate().is_err());

        // Without autothrottle there is no ceiling to violate
        config.politeness.autothrottle = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_concurrency_must_be_positive() {
        let mut config = Config::default();
        config.politeness.autothrottle_target_concurrency = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_crawler_name_validation() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "Bad Bot!".to_string();
        assert!(config.validate().is_err());

        config.user_agent.crawler_name = String::new();
        assert!(config.validate().is_err());

        config.user_agent.crawler_name = "good-bot_2".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_contact_url_must_parse() {
        let mut config = Config::default();
        config.user_agent.contact_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = Config::default();
        config.crawler.max_pages = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("example.com").is_ok());
        assert!(validate_domain_string("sub.example.com").is_ok());
        assert!(validate_domain_string("localhost").is_ok());
        assert!(validate_domain_string("127.0.0.1").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string(".example.com").is_err());
        assert!(validate_domain_string("example.com.").is_err());
        assert!(validate_domain_string("exa..mple.com").is_err());
        assert!(validate_domain_string("exa mple.com").is_err());
    }
}
