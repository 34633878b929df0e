use crate::config::WebsiteConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one sitemap fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotStatus {
    Success,
    Failed,
}

/// The URL list of one site at one point in time
///
/// A `Success` snapshot only holds same-site, filtered, deduplicated URLs,
/// at most `max_pages` of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapSnapshot {
    pub website_id: String,
    pub website_name: String,
    pub sitemap_url: String,
    pub urls: Vec<String>,
    pub last_fetched: DateTime<Utc>,
    pub status: SnapshotStatus,
    pub fetch_duration_ms: u64,
    pub total_urls: usize,
    pub error_message: Option<String>,
}

impl SitemapSnapshot {
    pub fn succeeded(
        site: &WebsiteConfig,
        urls: Vec<String>,
        elapsed: Duration,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            website_id: site.id.clone(),
            website_name: site.name.clone(),
            sitemap_url: site.sitemap_url.clone(),
            total_urls: urls.len(),
            urls,
            last_fetched: fetched_at,
            status: SnapshotStatus::Success,
            fetch_duration_ms: elapsed.as_millis() as u64,
            error_message: None,
        }
    }

    pub fn failed(
        site: &WebsiteConfig,
        error: impl Into<String>,
        elapsed: Duration,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            website_id: site.id.clone(),
            website_name: site.name.clone(),
            sitemap_url: site.sitemap_url.clone(),
            urls: Vec::new(),
            last_fetched: fetched_at,
            status: SnapshotStatus::Failed,
            fetch_duration_ms: elapsed.as_millis() as u64,
            total_urls: 0,
            error_message: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SnapshotStatus::Success
    }
}
