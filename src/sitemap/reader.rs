//! Sitemap reader
//!
//! Fetches a site's sitemap, descends into sitemap indexes and reduces the
//! result to a filtered URL list.

use crate::config::WebsiteConfig;
use crate::scheduler::{Clock, SystemClock};
use crate::fetch::{Backoff, FetchError, FetchRequest, HttpFetcher, RequestOverrides};
use crate::sitemap::parser::{parse_sitemap, SitemapDocument, SitemapParseError};
use crate::sitemap::traits::SitemapSource;
use crate::sitemap::types::SitemapSnapshot;
use crate::url::{UrlFilter, DEFAULT_MAX_PAGES};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Deepest sitemap index nesting followed
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Retries after the first attempt for every sitemap document
const SITEMAP_RETRIES: u32 = 2;

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Parse(#[from] SitemapParseError),

    #[error("invalid site configuration: {0}")]
    InvalidSite(String),

    #[error("all {count} child sitemap(s) of {index} failed, last error: {last}")]
    ChildrenFailed {
        index: String,
        count: usize,
        last: String,
    },
}

/// Reads sitemaps through the shared fetcher
pub struct SitemapReader {
    fetcher: Arc<HttpFetcher>,
    clock: Arc<dyn Clock>,
    max_depth: usize,
    retry_delay: Duration,
}

impl SitemapReader {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self {
            fetcher,
            clock: Arc::new(SystemClock),
            max_depth: DEFAULT_MAX_DEPTH,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Source of the `last_fetched` timestamp on snapshots
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Base delay of the linear retry backoff
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Builds a snapshot of a site's sitemap
    ///
    /// # Flow
    ///
    /// 1. Fetch `sitemap_url` (3 attempts, linear backoff)
    /// 2. Parse it; a `urlset` yields page URLs, a `sitemapindex` is
    ///    followed depth-first
    /// 3. Filter, deduplicate, order and cap the URLs
    ///
    /// Never fails: an invalid site, a root document that cannot be fetched
    /// or parsed, or an index none of whose children could be read produces
    /// a `Failed` snapshot. A failing child next to readable siblings is
    /// logged and skipped.
    pub async fn fetch_sitemap(&self, site: &WebsiteConfig) -> SitemapSnapshot {
        let started = Instant::now();

        match self.read_site(site).await {
            Ok(urls) => {
                tracing::info!(
                    "Sitemap for {} yielded {} URLs in {:?}",
                    site.name,
                    urls.len(),
                    started.elapsed()
                );
                SitemapSnapshot::succeeded(site, urls, started.elapsed(), self.clock.now())
            }
            Err(e) => {
                tracing::error!(
                    "Sitemap fetch failed for {} ({}): {}",
                    site.name,
                    site.sitemap_url,
                    e
                );
                SitemapSnapshot::failed(site, e.to_string(), started.elapsed(), self.clock.now())
            }
        }
    }

    async fn read_site(&self, site: &WebsiteConfig) -> Result<Vec<String>, SitemapError> {
        let filter = UrlFilter::new(&site.base_url, site.scraping.url_pattern.as_deref())
            .map_err(|e| SitemapError::InvalidSite(e.to_string()))?;

        let request_delay = site
            .scraping
            .request_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO);

        let mut visited = HashSet::new();
        let raw = self
            .collect(&site.sitemap_url, 0, request_delay, &mut visited)
            .await?;

        tracing::debug!(
            "Collected {} raw URLs from {} sitemap document(s) for {}",
            raw.len(),
            visited.len(),
            site.name
        );

        let max_pages = site.scraping.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
        Ok(filter.apply(raw, max_pages))
    }

    /// Collects page URLs from one document and, for an index, its children
    fn collect<'a>(
        &'a self,
        sitemap_url: &'a str,
        depth: usize,
        request_delay: Duration,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<Vec<String>, SitemapError>> {
        async move {
            visited.insert(sitemap_url.trim().to_string());

            let body = self.fetch_document(sitemap_url).await?;

            let children = match parse_sitemap(&body)? {
                SitemapDocument::UrlSet(urls) => return Ok(urls),
                SitemapDocument::Index(children) => children,
            };

            if depth >= self.max_depth {
                tracing::warn!(
                    "Sitemap index {} is nested deeper than {}, skipping {} child sitemap(s)",
                    sitemap_url,
                    self.max_depth,
                    children.len()
                );
                return Ok(Vec::new());
            }

            let mut urls = Vec::new();
            let mut attempted = 0usize;
            let mut succeeded = 0usize;
            let mut last_error = None;

            for child in &children {
                if visited.contains(child.as_str()) {
                    tracing::debug!("Skipping already visited sitemap {}", child);
                    continue;
                }

                if attempted > 0 && !request_delay.is_zero() {
                    tokio::time::sleep(request_delay).await;
                }
                attempted += 1;

                match self.collect(child, depth + 1, request_delay, visited).await {
                    Ok(child_urls) => {
                        succeeded += 1;
                        urls.extend(child_urls);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping child sitemap {}: {}", child, e);
                        last_error = Some(e.to_string());
                    }
                }
            }

            // An index whose every child failed says nothing about the site
            if attempted > 0 && succeeded == 0 {
                return Err(SitemapError::ChildrenFailed {
                    index: sitemap_url.to_string(),
                    count: attempted,
                    last: last_error.unwrap_or_default(),
                });
            }

            Ok(urls)
        }
        .boxed()
    }

    async fn fetch_document(&self, url: &str) -> Result<String, SitemapError> {
        tracing::debug!("Fetching sitemap {}", url);

        let request = FetchRequest::get(url).with_config(RequestOverrides {
            retries: Some(SITEMAP_RETRIES),
            retry_delay: Some(self.retry_delay),
            backoff: Some(Backoff::Linear),
            use_cache: Some(false),
            ..RequestOverrides::default()
        });

        let response = self.fetcher.fetch(&request).await?;
        Ok(response.content)
    }
}

#[async_trait]
impl SitemapSource for SitemapReader {
    async fn fetch_sitemap(&self, site: &WebsiteConfig) -> SitemapSnapshot {
        SitemapReader::fetch_sitemap(self, site).await
    }
}
