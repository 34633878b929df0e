use crate::common::test_fetcher;
use rival_harvest::extract::ContentExtractor;
use rival_harvest::fetch::FetchRequest;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GAME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Cave Runner | Free Online Game</title>
  <meta name="description" content="Sprint through collapsing caves, dodge falling rocks and collect gems in this endless runner.">
  <meta property="og:image" content="/img/cave-runner.jpg">
  <script type="application/ld+json">
  {"@context": "https://schema.org", "@type": "VideoGame", "name": "Cave Runner",
   "genre": "Arcade", "keywords": "runner, endless, caves",
   "aggregateRating": {"@type": "AggregateRating", "ratingValue": "4.2", "bestRating": "5"}}
  </script>
</head>
<body>
  <h1>Cave Runner</h1>
  <p>Use the arrow keys to run and space to jump over the gaps.</p>
  <a href="/games/lava-escape">Lava Escape</a>
  <img src="/img/screenshot-1.png">
</body>
</html>"#;

#[tokio::test]
async fn test_fetch_then_parse_generic_page() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/games/cave-runner"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(GAME_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher();
    let response = fetcher
        .fetch(&FetchRequest::get(&format!("{base}/games/cave-runner")))
        .await
        .unwrap();

    let result = ContentExtractor::new().parse_content(&response, None);

    assert!(result.success);
    assert_eq!(result.parser_name, "generic");
    assert!(result.quality_score > 0 && result.quality_score <= 100);
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);

    let content = result.content.unwrap();
    assert_eq!(content.title, "Cave Runner");
    assert!(content.description.starts_with("Sprint through collapsing caves"));
    assert_eq!(
        content.instructions.as_deref(),
        Some("Use the arrow keys to run and space to jump over the gaps.")
    );
    assert_eq!(content.tags, vec!["runner", "endless", "caves"]);
    assert_eq!(content.category.as_deref(), Some("Arcade"));
    assert_eq!(content.rating, Some(8.4));
    assert_eq!(content.thumbnail, Some(format!("{base}/img/cave-runner.jpg")));
    assert_eq!(content.links, vec![format!("{base}/games/lava-escape")]);
    assert_eq!(content.images, vec![format!("{base}/img/screenshot-1.png")]);
}

#[tokio::test]
async fn test_parse_result_serializes_to_json() {
    let extractor = ContentExtractor::new();
    let result = extractor.parse_html(GAME_PAGE, "https://poki.com/en/g/cave-runner", None);

    assert_eq!(result.parser_name, "poki");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["content"]["title"], "Cave Runner");
    assert!(json["quality_score"].as_u64().unwrap() <= 100);
}
