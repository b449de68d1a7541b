use crate::config::types::{
    Config, ContentConfig, CrawlerConfig, FetchConfig, FilterConfig, OutputConfig,
    PaginationConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(seed) = &config.seed {
        validate_seed(seed)?;
    }
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_content_config(&config.content)?;
    validate_pagination_config(&config.pagination)?;
    validate_filter_config(&config.filters)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.bfs_concurrency < 1 || config.bfs_concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "bfs_concurrency must be between 1 and 32, got {}",
            config.bfs_concurrency
        )));
    }

    if config.robots_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "robots_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch layer configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.navigation_timeout_ms < 1 || config.navigation_timeout_ms > 90_000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be between 1 and 90000, got {}",
            config.navigation_timeout_ms
        )));
    }

    if config.block_reload_min_ms > config.block_reload_max_ms {
        return Err(ConfigError::Validation(format!(
            "block_reload_min_ms ({}) exceeds block_reload_max_ms ({})",
            config.block_reload_min_ms, config.block_reload_max_ms
        )));
    }

    if config.human_pause_min_ms > config.human_pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "human_pause_min_ms ({}) exceeds human_pause_max_ms ({})",
            config.human_pause_min_ms, config.human_pause_max_ms
        )));
    }

    if config.pacing_request_growth < 0.0 || config.pacing_age_growth < 0.0 {
        return Err(ConfigError::Validation(
            "pacing growth factors cannot be negative".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.pacing_jitter) {
        return Err(ConfigError::Validation(format!(
            "pacing_jitter must be between 0.0 and 1.0, got {}",
            config.pacing_jitter
        )));
    }

    Ok(())
}

/// Validates chunking configuration
fn validate_content_config(config: &ContentConfig) -> Result<(), ConfigError> {
    if config.window_size == 0 {
        return Err(ConfigError::Validation(
            "window_size must be > 0".to_string(),
        ));
    }

    if config.overlap >= config.window_size {
        return Err(ConfigError::Validation(format!(
            "overlap ({}) must be smaller than window_size ({})",
            config.overlap, config.window_size
        )));
    }

    if config.min_chunk_chars > config.window_size {
        return Err(ConfigError::Validation(format!(
            "min_chunk_chars ({}) cannot exceed window_size ({})",
            config.min_chunk_chars, config.window_size
        )));
    }

    Ok(())
}

fn validate_pagination_config(config: &PaginationConfig) -> Result<(), ConfigError> {
    if config.page_size == 0 {
        return Err(ConfigError::Validation(
            "pagination page_size must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Validates URL filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for pattern in &config.exclude_patterns {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
    }

    for domain in &config.allowed_domains {
        validate_domain_pattern(domain)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    if config.content_dir.is_empty() {
        return Err(ConfigError::Validation(
            "content_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain pattern (supports a leading "*." wildcard)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is malformed",
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
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("localhost").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example..com").is_err());
        assert!(validate_domain_pattern("exa mple.com").is_err());
    }

    #[test]
    fn test_rejects_bad_seed() {
        let mut config = Config::default();
        config.seed = Some("ftp://example.com".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.concurrency = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_navigation_timeout_above_bound() {
        let mut config = Config::default();
        config.fetch.navigation_timeout_ms = 120_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_inverted_reload_window() {
        let mut config = Config::default();
        config.fetch.block_reload_min_ms = 10;
        config.fetch.block_reload_max_ms = 5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_invalid_exclude_pattern() {
        let mut config = Config::default();
        config.filters.exclude_patterns = vec!["(unclosed".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
