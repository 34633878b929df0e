use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Options controlling one parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Collapse whitespace and drop characters outside printable ASCII and CJK
    pub enable_text_cleaning: bool,
    /// Ignore text inside `script`, `style`, `noscript` and `template`
    pub enable_html_filtering: bool,
    /// Maximum characters kept per text field; 0 keeps everything
    pub max_text_length: usize,
    pub extract_links: bool,
    pub extract_images: bool,
    /// Field name to CSS selector, tried before the parser's own selectors
    pub custom_selectors: Option<BTreeMap<String, String>>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            enable_text_cleaning: true,
            enable_html_filtering: true,
            max_text_length: 5000,
            extract_links: true,
            extract_images: true,
            custom_selectors: None,
        }
    }
}

/// Structured content of a game page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedGameContent {
    pub title: String,
    pub description: String,
    pub instructions: Option<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub game_url: Option<String>,
    /// On a 0-10 scale
    pub rating: Option<f64>,
    pub developer: Option<String>,
    pub links: Vec<String>,
    pub images: Vec<String>,
}

/// Outcome of parsing one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub content: Option<ParsedGameContent>,
    pub error: Option<String>,
    pub parser_name: String,
    pub parse_time_ms: u64,
    /// 0 to 100
    pub quality_score: u32,
    /// 0 to 1, monotonic in `quality_score`
    pub confidence: f64,
}

impl ParseResult {
    pub fn success(
        parser_name: &str,
        content: ParsedGameContent,
        quality_score: u32,
        confidence: f64,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
            parser_name: parser_name.to_string(),
            parse_time_ms: elapsed.as_millis() as u64,
            quality_score,
            confidence,
        }
    }

    pub fn failure(parser_name: &str, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
            parser_name: parser_name.to_string(),
            parse_time_ms: elapsed.as_millis() as u64,
            quality_score: 0,
            confidence: 0.0,
        }
    }
}
