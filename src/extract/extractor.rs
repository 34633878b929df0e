use crate::extract::parsers::{CrazyGamesParser, GenericParser, ItchParser, PokiParser};
use crate::extract::profile::panic_message;
use crate::extract::traits::ContentParser;
use crate::extract::types::{ParseConfig, ParseResult};
use crate::fetch::FetchResponse;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Name under which the fallback parser is registered
pub const GENERIC_PARSER: &str = "generic";

/// Dispatches pages to the parser registered for their domain
///
/// Site parsers are consulted in registration order; pages no site parser
/// claims go to the generic fallback.
pub struct ContentExtractor {
    parsers: Vec<Arc<dyn ContentParser>>,
    fallback: Arc<dyn ContentParser>,
    default_config: ParseConfig,
}

impl ContentExtractor {
    /// Creates an extractor with the built-in parsers
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    /// Creates an extractor whose parses default to `config`
    pub fn with_config(config: ParseConfig) -> Self {
        Self {
            parsers: vec![
                Arc::new(PokiParser),
                Arc::new(CrazyGamesParser),
                Arc::new(ItchParser),
            ],
            fallback: Arc::new(GenericParser),
            default_config: config,
        }
    }

    /// Registers a parser, replacing any parser with the same name
    ///
    /// A parser named `generic` replaces the fallback.
    pub fn register_parser(&mut self, parser: Arc<dyn ContentParser>) {
        if parser.name() == GENERIC_PARSER {
            tracing::debug!("Replacing fallback parser");
            self.fallback = parser;
            return;
        }

        match self.parsers.iter().position(|p| p.name() == parser.name()) {
            Some(index) => {
                tracing::debug!("Replacing parser '{}'", parser.name());
                self.parsers[index] = parser;
            }
            None => {
                tracing::debug!("Registering parser '{}'", parser.name());
                self.parsers.push(parser);
            }
        }
    }

    /// The first site parser claiming the URL, else the fallback
    pub fn find_parser(&self, url: &str) -> Arc<dyn ContentParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(url))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// Parses a fetched page, dispatching on its final URL
    ///
    /// # Arguments
    ///
    /// * `response` - The fetched page
    /// * `config` - Parse options; the extractor's defaults when `None`
    pub fn parse_content(&self, response: &FetchResponse, config: Option<&ParseConfig>) -> ParseResult {
        self.parse_html(&response.content, &response.final_url, config)
    }

    /// Parses raw HTML as if fetched from `url`
    pub fn parse_html(&self, html: &str, url: &str, config: Option<&ParseConfig>) -> ParseResult {
        let config = config.unwrap_or(&self.default_config);
        let started = Instant::now();

        let parser = match catch_unwind(AssertUnwindSafe(|| self.find_parser(url))) {
            Ok(parser) => parser,
            Err(panic) => {
                let error = format!("parser lookup panicked: {}", panic_message(panic.as_ref()));
                tracing::error!("Failed to dispatch {}: {}", url, error);
                return ParseResult::failure(GENERIC_PARSER, error, started.elapsed());
            }
        };

        tracing::debug!("Parsing {} with '{}'", url, parser.name());

        match catch_unwind(AssertUnwindSafe(|| parser.parse(html, url, config))) {
            Ok(result) => result,
            Err(panic) => {
                let error = format!("parser panicked: {}", panic_message(panic.as_ref()));
                tracing::error!("'{}' failed on {}: {}", parser.name(), url, error);
                ParseResult::failure(parser.name(), error, started.elapsed())
            }
        }
    }

    /// Registered parser names in dispatch order, fallback last
    pub fn list_parsers(&self) -> Vec<String> {
        self.parsers
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|p| p.name().to_string())
            .collect()
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("parsers", &self.list_parsers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::parsers::builtin_profiles;
    use crate::extract::types::ParsedGameContent;
    use scraper::Selector;
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct StubParser {
        name: &'static str,
        domains: &'static [&'static str],
    }

    impl ContentParser for StubParser {
        fn name(&self) -> &str {
            self.name
        }

        fn domains(&self) -> &[&str] {
            self.domains
        }

        fn parse(&self, _html: &str, _url: &str, _config: &ParseConfig) -> ParseResult {
            let content = ParsedGameContent {
                title: "stub".to_string(),
                ..ParsedGameContent::default()
            };
            ParseResult::success(self.name, content, 10, 0.1, Duration::ZERO)
        }
    }

    struct PanickingParser;

    impl ContentParser for PanickingParser {
        fn name(&self) -> &str {
            "panicky"
        }

        fn domains(&self) -> &[&str] {
            &["panic.example"]
        }

        fn parse(&self, _html: &str, _url: &str, _config: &ParseConfig) -> ParseResult {
            panic!("selector blew up")
        }
    }

    fn response(url: &str, html: &str) -> FetchResponse {
        FetchResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
            content: html.to_string(),
            final_url: url.to_string(),
            from_cache: false,
            response_time_ms: 5,
        }
    }

    #[test]
    fn test_builtin_selectors_are_valid() {
        for (name, profile) in builtin_profiles() {
            for css in profile.all_selectors() {
                assert!(Selector::parse(css).is_ok(), "{name}: invalid selector '{css}'");
            }
        }
    }

    #[test]
    fn test_find_parser_dispatch() {
        let extractor = ContentExtractor::new();

        assert_eq!(extractor.find_parser("https://poki.com/en/g/a").name(), "poki");
        assert_eq!(extractor.find_parser("https://www.crazygames.com/game/a").name(), "crazygames");
        assert_eq!(extractor.find_parser("https://dev.itch.io/a").name(), "itch");
        assert_eq!(extractor.find_parser("https://other.example/a").name(), "generic");
        assert_eq!(extractor.find_parser("garbage").name(), "generic");
    }

    #[test]
    fn test_list_parsers() {
        let extractor = ContentExtractor::default();
        assert_eq!(
            extractor.list_parsers(),
            vec!["poki", "crazygames", "itch", "generic"]
        );
    }

    #[test]
    fn test_register_parser_replaces_by_name() {
        let mut extractor = ContentExtractor::new();
        extractor.register_parser(Arc::new(StubParser {
            name: "poki",
            domains: &["poki.com"],
        }));
        extractor.register_parser(Arc::new(StubParser {
            name: "newsite",
            domains: &["newsite.example"],
        }));

        assert_eq!(
            extractor.list_parsers(),
            vec!["poki", "crazygames", "itch", "newsite", "generic"]
        );

        let result = extractor.parse_html("<html></html>", "https://poki.com/en/g/a", None);
        assert_eq!(result.quality_score, 10);
        assert_eq!(extractor.find_parser("https://newsite.example/x").name(), "newsite");
    }

    #[test]
    fn test_register_generic_replaces_fallback() {
        let mut extractor = ContentExtractor::new();
        extractor.register_parser(Arc::new(StubParser {
            name: "generic",
            domains: &[],
        }));

        assert_eq!(extractor.list_parsers().len(), 4);
        let result = extractor.parse_html("<html></html>", "https://unknown.example/", None);
        assert!(result.success);
        assert_eq!(result.quality_score, 10);
    }

    #[test]
    fn test_parse_content_uses_final_url() {
        let extractor = ContentExtractor::new();
        let html = r#"<html><body><h1 data-testid="game-title">Temple Run 2</h1></body></html>"#;

        let result = extractor.parse_content(&response("https://poki.com/en/g/temple-run-2", html), None);

        assert!(result.success);
        assert_eq!(result.parser_name, "poki");
        assert_eq!(result.content.unwrap().title, "Temple Run 2");
    }

    #[test]
    fn test_panicking_parser_is_contained() {
        let mut extractor = ContentExtractor::new();
        extractor.register_parser(Arc::new(PanickingParser));

        let result = extractor.parse_html("<html></html>", "https://panic.example/game", None);

        assert!(!result.success);
        assert_eq!(result.parser_name, "panicky");
        assert_eq!(result.quality_score, 0);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.unwrap().contains("selector blew up"));
    }

    #[test]
    fn test_config_override() {
        let extractor = ContentExtractor::new();
        let html = r#"<html><body><h1>A very long game title</h1></body></html>"#;
        let config = ParseConfig {
            max_text_length: 6,
            ..ParseConfig::default()
        };

        let result = extractor.parse_html(html, "https://other.example/", Some(&config));
        assert_eq!(result.content.unwrap().title, "A very");
    }

    #[test]
    fn test_failure_for_missing_title() {
        let extractor = ContentExtractor::new();
        let result = extractor.parse_html("<html><body></body></html>", "https://other.example/", None);

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no title found"));
        assert_eq!(result.quality_score, 0);
    }
}
