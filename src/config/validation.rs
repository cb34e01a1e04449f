use crate::config::types::{
    Config, CrawlConfig, ExtractConfig, FilterConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_filter_config(&config.filter)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be between 1 and 64, got {}",
            config.max_concurrency
        )));
    }

    if config.politeness_delay < 50 {
        return Err(ConfigError::Validation(format!(
            "politeness-delay must be >= 50ms, got {}ms",
            config.politeness_delay
        )));
    }

    if config.fetch_timeout < 100 || config.fetch_timeout > 600_000 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout must be between 100ms and 600000ms, got {}ms",
            config.fetch_timeout
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    if config.seeds.is_empty() && config.seed_file.is_none() && config.sitemap.is_none() {
        return Err(ConfigError::Validation(
            "at least one of seeds, seed-file or sitemap must be set".to_string(),
        ));
    }

    for seed in &config.seeds {
        validate_http_url(seed, "seed")?;
    }

    if let Some(sitemap) = &config.sitemap {
        if sitemap.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sitemap cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates link filters
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for prefix in &config.include_prefixes {
        if prefix.is_empty() {
            return Err(ConfigError::Validation(
                "include-prefixes cannot contain an empty prefix".to_string(),
            ));
        }
        if prefix.contains("://") {
            validate_http_url(prefix, "include prefix")?;
        } else if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "include prefix '{}' must be an absolute URL or start with '/'",
                prefix
            )));
        }
    }

    if config.exclude_substrings.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Validation(
            "exclude-substrings cannot contain an empty pattern".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction selectors; every selector must parse
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.content_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "content-selectors must list at least one selector".to_string(),
        ));
    }

    let all_selectors = config
        .content_selectors
        .iter()
        .chain(&config.noise_selectors);

    for selector in all_selectors {
        validate_selector(selector)?;
    }

    let all_classes = config
        .admonition_classes
        .iter()
        .chain(&config.admonition_title_classes);

    for class in all_classes {
        if class.trim().is_empty() || class.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "admonition class '{}' must be a single non-empty class name",
                class
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    if config.title.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output title cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }

    Ok(())
}
