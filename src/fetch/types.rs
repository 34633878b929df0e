//! Request, response, configuration and error types of the fetch layer

use crate::config::FetchSettings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// HTTP method supported by the fetch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FetchMethod {
    Get,
    Head,
    Post,
}

impl FetchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
        }
    }
}

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Always `retry_delay`
    Fixed,
    /// `retry_delay × retry number`
    Linear,
}

impl Backoff {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32, base: Duration) -> Duration {
        match self {
            Self::Fixed => base,
            Self::Linear => base.saturating_mul(retry.max(1)),
        }
    }
}

/// Fetch layer configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retries: u32,
    /// Base delay between attempts
    pub retry_delay: Duration,
    pub backoff: Backoff,
    /// Upper bound of the random delay added to every retry
    pub retry_jitter: Duration,
    /// Maximum requests in flight
    pub concurrency: usize,
    pub enable_cache: bool,
    pub cache_capacity: usize,
    pub rotate_user_agent: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
            retry_jitter: Duration::ZERO,
            concurrency: 5,
            enable_cache: true,
            cache_capacity: 100,
            rotate_user_agent: true,
        }
    }
}

impl From<&FetchSettings> for FetchConfig {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            retries: settings.retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            concurrency: settings.concurrency,
            enable_cache: settings.enable_cache,
            cache_capacity: settings.cache_capacity,
            rotate_user_agent: settings.rotate_user_agent,
            ..Self::default()
        }
    }
}

impl FetchConfig {
    /// Applies per-request overrides on top of these defaults
    ///
    /// Concurrency and cache capacity are fetcher-wide and cannot be
    /// overridden per request.
    pub fn merged(&self, overrides: Option<&RequestOverrides>) -> FetchConfig {
        let mut merged = self.clone();
        if let Some(o) = overrides {
            if let Some(timeout) = o.timeout {
                merged.timeout = timeout;
            }
            if let Some(retries) = o.retries {
                merged.retries = retries;
            }
            if let Some(delay) = o.retry_delay {
                merged.retry_delay = delay;
            }
            if let Some(backoff) = o.backoff {
                merged.backoff = backoff;
            }
            if let Some(use_cache) = o.use_cache {
                merged.enable_cache = use_cache;
            }
            if let Some(rotate) = o.rotate_user_agent {
                merged.rotate_user_agent = rotate;
            }
        }
        merged
    }
}

/// Per-request overrides of the fetcher defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub backoff: Option<Backoff>,
    pub use_cache: Option<bool>,
    pub rotate_user_agent: Option<bool>,
}

/// A request submitted to the fetch layer
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: FetchMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub config: Option<RequestOverrides>,
}

impl FetchRequest {
    pub fn new(method: FetchMethod, url: &str) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: BTreeMap::new(),
            body: None,
            config: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(FetchMethod::Get, url)
    }

    pub fn head(url: &str) -> Self {
        Self::new(FetchMethod::Head, url)
    }

    pub fn post(url: &str, body: &str) -> Self {
        Self::new(FetchMethod::Post, url).with_body(body)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_config(mut self, overrides: RequestOverrides) -> Self {
        self.config = Some(overrides);
        self
    }
}

/// A completed response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub content: String,
    /// URL after redirects
    pub final_url: String,
    pub from_cache: bool,
    pub response_time_ms: u64,
}

/// Why an attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status} {status_text}")]
    HttpStatus { status: u16, status_text: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Terminal error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    /// Every attempt failed
    MaxRetriesExceeded,
    /// The request was rejected before any attempt
    InvalidRequest,
}

impl fmt::Display for FetchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxRetriesExceeded => write!(f, "MAX_RETRIES_EXCEEDED"),
            Self::InvalidRequest => write!(f, "INVALID_REQUEST"),
        }
    }
}

/// Terminal failure of a fetch
#[derive(Debug, Clone, Error)]
#[error("{code} for {url} after {retry_count} attempt(s): {cause}")]
pub struct FetchError {
    pub code: FetchErrorCode,
    pub url: String,
    /// Total attempts made
    pub retry_count: u32,
    pub cause: FetchFailure,
}

/// Snapshot of the fetch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub cache_hits: u64,
    pub current_concurrency: usize,
}
