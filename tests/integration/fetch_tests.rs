use crate::common::test_fetch_config;
use rival_harvest::fetch::{FetchConfig, FetchErrorCode, FetchRequest, HttpFetcher};
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_failing_fetch_makes_retries_plus_one_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(FetchConfig {
        retries: 2,
        ..test_fetch_config()
    })
    .expect("Failed to build fetcher");

    let err = fetcher
        .fetch(&FetchRequest::get(&format!("{}/broken", mock_server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.code, FetchErrorCode::MaxRetriesExceeded);
    assert_eq!(err.retry_count, 3);

    let stats = fetcher.stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.failed_requests, 1);
}

#[tokio::test]
async fn test_cache_serves_repeat_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(test_fetch_config()).expect("Failed to build fetcher");
    let request = FetchRequest::get(&format!("{}/page", mock_server.uri()));

    let first = fetcher.fetch(&request).await.unwrap();
    let second = fetcher.fetch(&request).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.content, second.content);
    assert_eq!(fetcher.stats().cache_hits, 1);

    fetcher.clear_cache();
    let third = fetcher.fetch(&request).await.unwrap();
    assert!(!third.from_cache);
    assert_eq!(third.content, "hello");
}

#[tokio::test]
async fn test_post_sends_body_and_bypasses_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string("q=snake"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(test_fetch_config()).expect("Failed to build fetcher");
    let request = FetchRequest::post(&format!("{}/search", mock_server.uri()), "q=snake");

    let first = fetcher.fetch(&request).await.unwrap();
    let second = fetcher.fetch(&request).await.unwrap();

    assert_eq!(first.content, "found");
    assert!(!second.from_cache);
    assert_eq!(fetcher.stats().cache_hits, 0);
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("cache-control", "no-cache"))
        .and(header("pragma", "no-cache"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(test_fetch_config()).expect("Failed to build fetcher");
    let response = fetcher
        .fetch(&FetchRequest::get(&format!("{}/headers", mock_server.uri())))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_final_url_follows_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(test_fetch_config()).expect("Failed to build fetcher");
    let response = fetcher
        .fetch(&FetchRequest::get(&format!("{}/old", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(response.content, "moved");
    assert_eq!(response.final_url, format!("{}/new", mock_server.uri()));
}

#[tokio::test]
async fn test_is_accessible_uses_head() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(test_fetch_config()).expect("Failed to build fetcher");

    assert!(fetcher.is_accessible(&format!("{}/up", mock_server.uri())).await);
    assert!(!fetcher.is_accessible(&format!("{}/down", mock_server.uri())).await);
}
