//! Rival-Harvest: competitor game-page acquisition
//!
//! This crate discovers competitor game pages through their sitemaps, keeps an
//! incremental record of which URLs are new on every refresh, and extracts
//! structured game content from fetched pages for downstream content
//! generation.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod scheduler;
pub mod sitemap;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, UpdateTaskConfig, WebsiteConfig};
pub use extract::{ContentExtractor, ParseConfig, ParseResult, ParsedGameContent};
pub use fetch::{FetchConfig, FetchRequest, FetchResponse, HttpFetcher};
pub use scheduler::{UpdateScheduler, UpdateTaskResult};
pub use sitemap::{SitemapReader, SitemapSnapshot};
