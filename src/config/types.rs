use serde::{Deserialize, Serialize};

/// Main configuration structure for Rival-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub scheduler: UpdateTaskConfig,
    pub storage: StorageSettings,
    #[serde(default, rename = "website")]
    pub websites: Vec<WebsiteConfig>,
}

/// HTTP fetch layer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchSettings {
    /// Per-attempt timeout (seconds)
    pub timeout_secs: u64,

    /// Number of retries after the first attempt
    pub retries: u32,

    /// Base delay between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Maximum number of requests in flight
    pub concurrency: usize,

    /// Whether successful GET responses are cached
    pub enable_cache: bool,

    /// Maximum number of cached responses
    pub cache_capacity: usize,

    /// Whether a User-Agent is picked from the rotation pool per request
    pub rotate_user_agent: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 2,
            retry_delay_ms: 1000,
            concurrency: 5,
            enable_cache: true,
            cache_capacity: 100,
            rotate_user_agent: true,
        }
    }
}

/// Process-wide scheduling policy
///
/// Persisted by the scheduler and editable at runtime through
/// `UpdateScheduler::update_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UpdateTaskConfig {
    /// Hours between automatic refreshes
    pub interval_hours: u64,

    /// Whether the periodic ticker runs updates
    pub auto_update: bool,

    /// Sites updated concurrently per batch
    pub max_concurrent: usize,

    /// Retries per site after the first failed sitemap fetch
    pub max_retries: u32,

    /// Skip sites whose `enabled` flag is false
    pub only_enabled_sites: bool,
}

impl Default for UpdateTaskConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            auto_update: true,
            max_concurrent: 3,
            max_retries: 2,
            only_enabled_sites: true,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageSettings {
    /// Path to the SQLite database file
    pub database_path: String,
}

/// One competitor site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WebsiteConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub sitemap_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub scraping: ScrapingConfig,
}

fn default_enabled() -> bool {
    true
}

/// Per-site sitemap filtering options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScrapingConfig {
    /// Regex a URL must match; replaces the default exclusion list when set
    pub url_pattern: Option<String>,

    /// Maximum number of URLs kept per snapshot
    pub max_pages: Option<usize>,

    /// Pause between child sitemap fetches (milliseconds)
    pub request_delay_ms: Option<u64>,
}

impl WebsiteConfig {
    /// Creates an enabled site with default scraping options
    pub fn new(id: &str, name: &str, base_url: &str, sitemap_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.to_string(),
            sitemap_url: sitemap_url.to_string(),
            enabled: true,
            scraping: ScrapingConfig::default(),
        }
    }
}
