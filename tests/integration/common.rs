use rival_harvest::config::WebsiteConfig;
use rival_harvest::fetch::{FetchConfig, HttpFetcher};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast-failing fetch settings for tests
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_secs(5),
        retry_delay: Duration::from_millis(10),
        ..FetchConfig::default()
    }
}

pub fn test_fetcher() -> Arc<HttpFetcher> {
    Arc::new(HttpFetcher::new(test_fetch_config()).expect("Failed to build HTTP client"))
}

/// A site hosted on the mock server with its sitemap at `sitemap_path`
pub fn mock_site(server: &MockServer, id: &str, sitemap_path: &str) -> WebsiteConfig {
    let base = server.uri();
    WebsiteConfig::new(id, &format!("Site {id}"), &base, &format!("{base}{sitemap_path}"))
}

pub fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <url><loc>{loc}</loc></url>\n"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{entries}</urlset>"
    )
}

pub fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <sitemap><loc>{loc}</loc></sitemap>\n"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{entries}</sitemapindex>"
    )
}

/// Serves an XML body at `route`
pub async fn serve_xml(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

/// Absolute URLs of game pages on the mock server
pub fn pages(server: &MockServer, slugs: &[&str]) -> Vec<String> {
    slugs
        .iter()
        .map(|slug| format!("{}/game/{}", server.uri(), slug))
        .collect()
}
