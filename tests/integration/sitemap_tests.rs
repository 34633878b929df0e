use crate::common::{mock_site, pages, serve_xml, sitemap_index, test_fetcher, urlset};
use rival_harvest::sitemap::{SitemapReader, SnapshotStatus};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reader() -> SitemapReader {
    SitemapReader::new(test_fetcher()).with_retry_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn test_urlset_snapshot() {
    let mock_server = MockServer::start().await;
    let urls = pages(&mock_server, &["alpha", "beta", "gamma"]);
    serve_xml(&mock_server, "/sitemap.xml", urlset(&urls)).await;

    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let snapshot = reader().fetch_sitemap(&site).await;

    assert_eq!(snapshot.status, SnapshotStatus::Success);
    assert_eq!(snapshot.total_urls, 3);
    assert_eq!(snapshot.urls.len(), 3);
    assert_eq!(snapshot.website_id, "mock");
    assert!(snapshot.error_message.is_none());
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let mock_server = MockServer::start().await;
    let child = format!("{}/sitemap-games.xml", mock_server.uri());

    serve_xml(&mock_server, "/sitemap.xml", sitemap_index(&[child])).await;
    serve_xml(
        &mock_server,
        "/sitemap-games.xml",
        urlset(&pages(&mock_server, &["only-game"])),
    )
    .await;

    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let snapshot = reader().fetch_sitemap(&site).await;

    assert!(snapshot.is_success());
    assert_eq!(snapshot.total_urls, 1);
    assert_eq!(snapshot.urls, pages(&mock_server, &["only-game"]));
}

#[tokio::test]
async fn test_filtering_and_cap() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let mut urls = pages(&mock_server, &["one", "two", "three", "one"]);
    urls.push(format!("{base}/feed/"));
    urls.push(format!("{base}/assets/logo.png"));
    urls.push("https://elsewhere.example/game/one".to_string());
    serve_xml(&mock_server, "/sitemap.xml", urlset(&urls)).await;

    let mut site = mock_site(&mock_server, "mock", "/sitemap.xml");
    site.scraping.max_pages = Some(2);
    let snapshot = reader().fetch_sitemap(&site).await;

    assert!(snapshot.is_success());
    assert_eq!(snapshot.total_urls, 2);
    assert!(snapshot.urls.iter().all(|u| u.starts_with(&format!("{base}/game/"))));
}

#[tokio::test]
async fn test_url_pattern_replaces_default_exclusions() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let urls = vec![
        format!("{base}/game/one"),
        format!("{base}/blog/news"),
        format!("{base}/game/two"),
    ];
    serve_xml(&mock_server, "/sitemap.xml", urlset(&urls)).await;

    let mut site = mock_site(&mock_server, "mock", "/sitemap.xml");
    site.scraping.url_pattern = Some("/game/".to_string());
    let snapshot = reader().fetch_sitemap(&site).await;

    assert_eq!(snapshot.total_urls, 2);
    assert!(!snapshot.urls.iter().any(|u| u.contains("/blog/")));
}

#[tokio::test]
async fn test_unreachable_sitemap_fails_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let snapshot = reader().fetch_sitemap(&site).await;

    assert_eq!(snapshot.status, SnapshotStatus::Failed);
    assert_eq!(snapshot.total_urls, 0);
    assert!(snapshot.error_message.unwrap().contains("503"));
}

#[tokio::test]
async fn test_malformed_sitemap_fails() {
    let mock_server = MockServer::start().await;
    serve_xml(&mock_server, "/sitemap.xml", "<urlset><url><loc>".to_string()).await;

    let site = mock_site(&mock_server, "mock", "/sitemap.xml");
    let snapshot = reader().fetch_sitemap(&site).await;

    assert_eq!(snapshot.status, SnapshotStatus::Failed);
    assert!(snapshot.error_message.is_some());
}
