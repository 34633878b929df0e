//! Query helpers over a parsed page
//!
//! Wraps a `scraper::Html` with the page URL and the parse options, so
//! selectors, metadata lookups and heuristics all honour HTML filtering,
//! text cleaning and truncation the same way.

use crate::extract::text::{clean_text, scale_rating, truncate_chars};
use crate::extract::types::ParseConfig;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Elements whose text never counts as page content
const FILTERED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that separate words when their text is concatenated
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "br", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "section", "article", "header", "footer", "dt", "dd", "span",
];

/// JSON-LD `@type`s describing a game
const GAME_TYPES: &[&str] = &[
    "VideoGame",
    "Game",
    "SoftwareApplication",
    "WebApplication",
    "MobileApplication",
];

pub struct PageDocument<'a> {
    html: Html,
    base: Url,
    config: &'a ParseConfig,
    json_ld: Vec<Value>,
}

impl<'a> PageDocument<'a> {
    /// Parses a page; fails only when `url` is not an absolute URL
    pub fn parse(html: &str, url: &str, config: &'a ParseConfig) -> Result<Self, String> {
        let base = Url::parse(url.trim()).map_err(|e| format!("invalid page URL '{url}': {e}"))?;
        let html = Html::parse_document(html);
        let json_ld = read_json_ld(&html);

        Ok(Self {
            html,
            base,
            config,
            json_ld,
        })
    }

    pub fn url(&self) -> &Url {
        &self.base
    }

    /// Cleans and truncates raw text per the parse options; `None` if empty
    pub fn finish_text(&self, raw: &str) -> Option<String> {
        let text = if self.config.enable_text_cleaning {
            clean_text(raw)
        } else {
            raw.trim().to_string()
        };
        let text = truncate_chars(&text, self.config.max_text_length);
        (!text.is_empty()).then_some(text)
    }

    /// First non-empty text matched by a selector
    pub fn text_of(&self, selector: &Selector) -> Option<String> {
        self.html
            .select(selector)
            .filter(|el| !self.is_filtered(el))
            .find_map(|el| self.element_text(el))
    }

    /// First non-empty text matched by any of the CSS selectors, in order
    pub fn first_text(&self, selectors: &[&str]) -> Option<String> {
        selectors
            .iter()
            .filter_map(|s| static_selector(s))
            .find_map(|selector| self.text_of(&selector))
    }

    /// Every non-empty text matched by a selector, deduplicated
    pub fn texts_of(&self, selector: &Selector) -> Vec<String> {
        let mut seen = HashSet::new();
        self.html
            .select(selector)
            .filter(|el| !self.is_filtered(el))
            .filter_map(|el| self.element_text(el))
            .filter(|text| seen.insert(text.to_lowercase()))
            .collect()
    }

    /// Texts of the first selector that matches anything
    pub fn first_texts(&self, selectors: &[&str]) -> Vec<String> {
        selectors
            .iter()
            .filter_map(|s| static_selector(s))
            .map(|selector| self.texts_of(&selector))
            .find(|texts| !texts.is_empty())
            .unwrap_or_default()
    }

    /// First URL-valued attribute of an element, resolved against the page
    pub fn url_of(&self, selector: &Selector) -> Option<String> {
        self.html.select(selector).find_map(|el| {
            ["src", "data-src", "content", "href"]
                .iter()
                .filter_map(|attr| el.value().attr(attr))
                .find_map(|value| resolve_link(value, &self.base))
        })
    }

    pub fn first_url(&self, selectors: &[&str]) -> Option<String> {
        selectors
            .iter()
            .filter_map(|s| static_selector(s))
            .find_map(|selector| self.url_of(&selector))
    }

    /// `content` of the first `<meta name=…>` or `<meta property=…>` found
    pub fn meta(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            let css = format!(r#"meta[name="{key}"], meta[property="{key}"]"#);
            let selector = static_selector(&css)?;
            self.html
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .find_map(|content| self.finish_text(content))
        })
    }

    /// Like `meta`, resolving the value as a URL
    pub fn meta_url(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            let css = format!(r#"meta[name="{key}"], meta[property="{key}"]"#);
            let selector = static_selector(&css)?;
            self.html
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .find_map(|content| resolve_link(content, &self.base))
        })
    }

    pub fn title_tag(&self) -> Option<String> {
        self.first_text(&["head > title", "title"])
    }

    /// `<link rel="canonical">`, resolved
    pub fn canonical(&self) -> Option<String> {
        self.first_url(&["link[rel='canonical'][href]"])
    }

    /// Cleaned text of every paragraph, in document order
    pub fn paragraphs(&self) -> Vec<String> {
        match static_selector("p") {
            Some(selector) => self
                .html
                .select(&selector)
                .filter(|el| !self.is_filtered(el))
                .filter_map(|el| self.element_text(el))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Absolute http(s) link targets, deduplicated
    pub fn links(&self) -> Vec<String> {
        let mut urls = Vec::new();
        if let Some(selector) = static_selector("a[href]") {
            for element in self.html.select(&selector) {
                if element.value().attr("download").is_some() {
                    continue;
                }
                if let Some(url) = element.value().attr("href").and_then(|h| resolve_link(h, &self.base)) {
                    urls.push(url);
                }
            }
        }
        dedup(urls)
    }

    /// Absolute image URLs (`src`, then `data-src`), deduplicated
    pub fn images(&self) -> Vec<String> {
        let mut urls = Vec::new();
        if let Some(selector) = static_selector("img") {
            for element in self.html.select(&selector) {
                let url = ["src", "data-src"]
                    .iter()
                    .filter_map(|attr| element.value().attr(attr))
                    .find_map(|value| resolve_link(value, &self.base));
                if let Some(url) = url {
                    urls.push(url);
                }
            }
        }
        dedup(urls)
    }

    // ===== JSON-LD =====

    /// The first JSON-LD object typed as a game
    pub fn game_ld(&self) -> Option<&Value> {
        self.json_ld.iter().find_map(find_game)
    }

    pub fn ld_text(&self, key: &str) -> Option<String> {
        let value = self.game_ld()?.get(key)?;
        ld_string(value).and_then(|s| self.finish_text(&s))
    }

    pub fn ld_url(&self, key: &str) -> Option<String> {
        let value = self.game_ld()?.get(key)?;
        ld_url_string(value).and_then(|s| resolve_link(&s, &self.base))
    }

    /// `keywords` as a list; comma-separated strings are split
    pub fn ld_keywords(&self) -> Vec<String> {
        let Some(value) = self.game_ld().and_then(|g| g.get("keywords")) else {
            return Vec::new();
        };
        let raw: Vec<String> = match value {
            Value::String(s) => s.split(',').map(str::to_string).collect(),
            Value::Array(items) => items.iter().filter_map(ld_string).collect(),
            _ => Vec::new(),
        };
        let mut seen = HashSet::new();
        raw.iter()
            .filter_map(|k| self.finish_text(k))
            .filter(|k| seen.insert(k.to_lowercase()))
            .collect()
    }

    /// `aggregateRating` normalized to 0-10
    pub fn ld_rating(&self) -> Option<f64> {
        let rating = self.game_ld()?.get("aggregateRating")?;
        let value = ld_number(rating.get("ratingValue")?)?;
        let best = rating.get("bestRating").and_then(ld_number);
        scale_rating(value, best)
    }

    // ===== Internals =====

    fn element_text(&self, element: ElementRef) -> Option<String> {
        let mut raw = String::new();
        collect_text(element, self.config.enable_html_filtering, &mut raw);
        if raw.trim().is_empty() {
            if let Some(content) = element.value().attr("content") {
                raw = content.to_string();
            }
        }
        self.finish_text(&raw)
    }

    fn is_filtered(&self, element: &ElementRef) -> bool {
        if !self.config.enable_html_filtering {
            return false;
        }
        std::iter::once(element.value().name())
            .chain(
                element
                    .ancestors()
                    .filter_map(|node| node.value().as_element().map(|e| e.name())),
            )
            .any(|name| FILTERED_TAGS.contains(&name))
    }
}

/// Parses a selector written in code; such selectors are known to be valid
fn static_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(_) => {
            tracing::debug!("Skipping unparseable selector '{}'", css);
            None
        }
    }
}

fn collect_text(element: ElementRef, filter: bool, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if filter && FILTERED_TAGS.contains(&name) {
                continue;
            }
            collect_text(child_element, filter, out);
            if BLOCK_TAGS.contains(&name) {
                out.push(' ');
            }
        }
    }
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty and fragment-only hrefs, `javascript:`, `mailto:`,
/// `tel:` and `data:` links, and anything that does not resolve to http(s).
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

fn read_json_ld(html: &Html) -> Vec<Value> {
    let Some(selector) = static_selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    html.select(&selector)
        .filter_map(|el| serde_json::from_str(el.text().collect::<String>().trim()).ok())
        .collect()
}

fn find_game(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_game),
        Value::Object(map) => {
            if map.get("@type").is_some_and(is_game_type) {
                return Some(value);
            }
            map.get("@graph").and_then(find_game)
        }
        _ => None,
    }
}

fn is_game_type(value: &Value) -> bool {
    match value {
        Value::String(t) => GAME_TYPES.contains(&t.as_str()),
        Value::Array(types) => types.iter().any(is_game_type),
        _ => false,
    }
}

/// A string, an object's `name`, or the first of an array
fn ld_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("name").and_then(ld_string),
        Value::Array(items) => items.iter().find_map(ld_string),
        _ => None,
    }
}

/// A string, an object's `url`, or the first of an array
fn ld_url_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("url").or_else(|| map.get("contentUrl")).and_then(ld_url_string),
        Value::Array(items) => items.iter().find_map(ld_url_string),
        _ => None,
    }
}

fn ld_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<html>
<head>
  <title>Subway Surfers - Play Online</title>
  <meta name="description" content="  Dash through   the subway! ">
  <meta property="og:image" content="/images/subway.png">
  <link rel="canonical" href="https://poki.com/en/g/subway-surfers">
  <script type="application/ld+json">
    {"@context": "https://schema.org", "@graph": [
      {"@type": "WebPage", "name": "Page"},
      {"@type": ["VideoGame", "SoftwareApplication"], "name": "Subway Surfers",
       "image": {"url": "https://img.poki.com/subway.png"},
       "keywords": "runner, 3D, Runner",
       "author": {"@type": "Organization", "name": "SYBO"},
       "aggregateRating": {"ratingValue": "4.6", "bestRating": 5}}
    ]}
  </script>
</head>
<body>
  <h1>Subway <b>Surfers</b><script>var x = 1;</script></h1>
  <noscript><p>Please enable JavaScript to play this wonderful game right now.</p></noscript>
  <p>Short.</p>
  <ul class="tags"><li>Runner</li><li>3D</li><li>runner</li></ul>
  <a href="/en/g/temple-run">Temple Run</a>
  <a href="/en/g/temple-run">Again</a>
  <a href="mailto:hi@poki.com">Mail</a>
  <a href="#top">Top</a>
  <img src="/thumbs/a.png"><img data-src="https://cdn.poki.com/b.png"><img src="data:image/png;base64,AA">
</body>
</html>"##;

    fn doc(config: &ParseConfig) -> PageDocument<'_> {
        PageDocument::parse(PAGE, "https://poki.com/en/g/subway-surfers", config).unwrap()
    }

    #[test]
    fn test_text_respects_html_filtering() {
        let config = ParseConfig::default();
        assert_eq!(doc(&config).first_text(&["h1"]), Some("Subway Surfers".to_string()));

        let unfiltered = ParseConfig {
            enable_html_filtering: false,
            ..ParseConfig::default()
        };
        assert_eq!(
            doc(&unfiltered).first_text(&["h1"]),
            Some("Subway Surfersvar x = 1;".to_string())
        );
    }

    #[test]
    fn test_paragraphs_skip_noscript() {
        let config = ParseConfig::default();
        assert_eq!(doc(&config).paragraphs(), vec!["Short."]);
    }

    #[test]
    fn test_first_text_falls_through_selectors() {
        let config = ParseConfig::default();
        assert_eq!(
            doc(&config).first_text(&[".missing", "h1"]),
            Some("Subway Surfers".to_string())
        );
        assert_eq!(doc(&config).first_text(&[".missing"]), None);
    }

    #[test]
    fn test_list_texts_deduplicated() {
        let config = ParseConfig::default();
        assert_eq!(doc(&config).first_texts(&[".tags li"]), vec!["Runner", "3D"]);
    }

    #[test]
    fn test_meta_and_canonical() {
        let config = ParseConfig::default();
        let page = doc(&config);
        assert_eq!(page.meta(&["description"]), Some("Dash through the subway!".to_string()));
        assert_eq!(
            page.meta_url(&["og:image"]),
            Some("https://poki.com/images/subway.png".to_string())
        );
        assert_eq!(
            page.canonical(),
            Some("https://poki.com/en/g/subway-surfers".to_string())
        );
        assert_eq!(page.title_tag(), Some("Subway Surfers - Play Online".to_string()));
    }

    #[test]
    fn test_json_ld_game() {
        let config = ParseConfig::default();
        let page = doc(&config);
        assert_eq!(page.ld_text("name"), Some("Subway Surfers".to_string()));
        assert_eq!(page.ld_text("author"), Some("SYBO".to_string()));
        assert_eq!(page.ld_url("image"), Some("https://img.poki.com/subway.png".to_string()));
        assert_eq!(page.ld_keywords(), vec!["runner", "3D"]);
        assert_eq!(page.ld_rating(), Some(9.2));
    }

    #[test]
    fn test_links_and_images() {
        let config = ParseConfig::default();
        let page = doc(&config);
        assert_eq!(page.links(), vec!["https://poki.com/en/g/temple-run"]);
        assert_eq!(
            page.images(),
            vec!["https://poki.com/thumbs/a.png", "https://cdn.poki.com/b.png"]
        );
    }

    #[test]
    fn test_truncation() {
        let config = ParseConfig {
            max_text_length: 6,
            ..ParseConfig::default()
        };
        assert_eq!(doc(&config).first_text(&["h1"]), Some("Subway".to_string()));
    }

    #[test]
    fn test_invalid_page_url() {
        let config = ParseConfig::default();
        assert!(PageDocument::parse(PAGE, "not a url", &config).is_err());
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://example.com/page").unwrap();
        assert_eq!(resolve_link("/other", &base), Some("https://example.com/other".to_string()));
        assert_eq!(resolve_link("other", &base), Some("https://example.com/other".to_string()));
        assert_eq!(resolve_link("JavaScript:void(0)", &base), None);
        assert_eq!(resolve_link("tel:+1234567890", &base), None);
        assert_eq!(resolve_link("#section", &base), None);
        assert_eq!(resolve_link("ftp://example.com/f", &base), None);
    }
}
