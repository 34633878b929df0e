use crate::config::WebsiteConfig;
use crate::sitemap::types::SitemapSnapshot;
use async_trait::async_trait;

/// Produces a snapshot of a site's sitemap
///
/// Implementations never fail; failures are recorded in the snapshot.
#[async_trait]
pub trait SitemapSource: Send + Sync {
    async fn fetch_sitemap(&self, site: &WebsiteConfig) -> SitemapSnapshot;
}
