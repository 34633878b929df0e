use crate::config::types::{Config, FetchSettings, StorageSettings, UpdateTaskConfig, WebsiteConfig};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_settings(&config.fetch)?;
    validate_task_config(&config.scheduler)?;
    validate_storage_settings(&config.storage)?;
    validate_websites(&config.websites)?;
    Ok(())
}

/// One year
const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Validates fetch layer settings
fn validate_fetch_settings(config: &FetchSettings) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 50 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 50, got {}",
            config.concurrency
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.enable_cache && config.cache_capacity < 1 {
        return Err(ConfigError::Validation(
            "cache_capacity must be >= 1 when the cache is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates the scheduling policy
///
/// Also used when the policy is replaced at runtime.
pub fn validate_task_config(config: &UpdateTaskConfig) -> Result<(), ConfigError> {
    if config.interval_hours < 1 || config.interval_hours > MAX_INTERVAL_HOURS {
        return Err(ConfigError::Validation(format!(
            "interval_hours must be between 1 and {MAX_INTERVAL_HOURS}, got {}",
            config.interval_hours
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > 20 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 20, got {}",
            config.max_concurrent
        )));
    }

    Ok(())
}

/// Validates storage settings
fn validate_storage_settings(config: &StorageSettings) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the competitor site list
fn validate_websites(websites: &[WebsiteConfig]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for site in websites {
        if site.id.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Website '{}' must have a non-empty id",
                site.name
            )));
        }

        if !seen_ids.insert(site.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate website id '{}'",
                site.id
            )));
        }

        validate_http_url(&site.base_url, "base-url", &site.id)?;
        validate_http_url(&site.sitemap_url, "sitemap-url", &site.id)?;

        if let Some(pattern) = &site.scraping.url_pattern {
            Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidPattern(format!(
                    "Website '{}' has invalid url-pattern '{}': {}",
                    site.id, pattern, e
                ))
            })?;
        }

        if site.scraping.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "Website '{}' max-pages must be >= 1",
                site.id
            )));
        }
    }

    Ok(())
}

/// Validates that a URL parses and uses http or https
fn validate_http_url(value: &str, field: &str, site_id: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Website '{}' has invalid {} '{}': {}",
            site_id, field, value, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Website '{}' {} must use http or https, got '{}'",
            site_id, field, value
        )));
    }

    Ok(())
}
