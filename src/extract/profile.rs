//! The selector cascade shared by every parser
//!
//! Each field is resolved in order from:
//! 1. The caller's custom selector for that field
//! 2. The site profile's CSS selector candidates
//! 3. Embedded metadata (`<meta>` tags, JSON-LD)
//! 4. Heuristic text scanning

use crate::extract::document::PageDocument;
use crate::extract::score::score_content;
use crate::extract::types::{ParseConfig, ParseResult, ParsedGameContent};
use scraper::Selector;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Minimum length of a paragraph taken as the description
const MIN_DESCRIPTION_PARAGRAPH: usize = 50;

/// Most paragraphs joined into heuristic instructions
const MAX_INSTRUCTION_PARAGRAPHS: usize = 3;

/// Words that mark a paragraph as describing controls
const CONTROL_KEYWORDS: &[&str] = &[
    "arrow keys",
    "wasd",
    "mouse",
    "click",
    "tap",
    "press",
    "spacebar",
    "space bar",
    "controls",
    "keyboard",
    "swipe",
    "drag",
    "use the",
];

/// Fields a custom selector may target
pub const FIELDS: &[&str] = &[
    "title",
    "description",
    "instructions",
    "features",
    "tags",
    "category",
    "thumbnail",
    "rating",
    "developer",
    "game_url",
];

/// Per-site CSS selector candidates, tried in order
#[derive(Debug, Clone, Copy)]
pub struct SiteProfile {
    pub title: &'static [&'static str],
    pub description: &'static [&'static str],
    pub instructions: &'static [&'static str],
    pub features: &'static [&'static str],
    pub tags: &'static [&'static str],
    pub category: &'static [&'static str],
    pub thumbnail: &'static [&'static str],
    pub rating: &'static [&'static str],
    pub developer: &'static [&'static str],
    pub game_frame: &'static [&'static str],
}

impl SiteProfile {
    /// Every selector of the profile, for validation
    pub fn all_selectors(&self) -> impl Iterator<Item = &'static str> {
        [
            self.title,
            self.description,
            self.instructions,
            self.features,
            self.tags,
            self.category,
            self.thumbnail,
            self.rating,
            self.developer,
            self.game_frame,
        ]
        .into_iter()
        .flatten()
        .copied()
    }

    /// Extracts a page with this profile
    ///
    /// # Returns
    ///
    /// * `Ok(ParsedGameContent)` - At least a title was found
    /// * `Err(String)` - Invalid URL or custom selector, or no title anywhere
    pub fn extract(&self, html: &str, url: &str, config: &ParseConfig) -> Result<ParsedGameContent, String> {
        let custom = CustomSelectors::parse(config)?;
        let doc = PageDocument::parse(html, url, config)?;

        let title = custom
            .text(&doc, "title")
            .or_else(|| doc.first_text(self.title))
            .or_else(|| doc.meta(&["og:title", "twitter:title"]))
            .or_else(|| doc.ld_text("name"))
            .or_else(|| doc.title_tag())
            .ok_or_else(|| "no title found".to_string())?;

        let description = custom
            .text(&doc, "description")
            .or_else(|| doc.first_text(self.description))
            .or_else(|| doc.meta(&["description", "og:description", "twitter:description"]))
            .or_else(|| doc.ld_text("description"))
            .or_else(|| first_long_paragraph(&doc))
            .unwrap_or_default();

        let instructions = custom
            .text(&doc, "instructions")
            .or_else(|| doc.first_text(self.instructions))
            .or_else(|| control_paragraphs(&doc));

        let features = custom
            .texts(&doc, "features")
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| doc.first_texts(self.features));

        let mut tags = custom
            .texts(&doc, "tags")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| doc.first_texts(self.tags));
        if tags.is_empty() {
            tags = doc.ld_keywords();
        }
        if tags.is_empty() {
            tags = meta_keywords(&doc);
        }

        let category = custom
            .text(&doc, "category")
            .or_else(|| doc.first_text(self.category))
            .or_else(|| doc.ld_text("genre"))
            .or_else(|| doc.ld_text("applicationCategory"));

        let thumbnail = custom
            .url(&doc, "thumbnail")
            .or_else(|| doc.first_url(self.thumbnail))
            .or_else(|| doc.meta_url(&["og:image", "twitter:image"]))
            .or_else(|| doc.ld_url("image"));

        let rating = custom
            .text(&doc, "rating")
            .or_else(|| doc.first_text(self.rating))
            .and_then(|text| crate::extract::text::normalize_rating(&text))
            .or_else(|| doc.ld_rating());

        let developer = custom
            .text(&doc, "developer")
            .or_else(|| doc.first_text(self.developer))
            .or_else(|| doc.ld_text("author"))
            .or_else(|| doc.ld_text("publisher"));

        let game_url = custom
            .url(&doc, "game_url")
            .or_else(|| doc.first_url(self.game_frame))
            .or_else(|| doc.canonical())
            .or_else(|| Some(doc.url().to_string()));

        let links = if config.extract_links { doc.links() } else { Vec::new() };
        let images = if config.extract_images { doc.images() } else { Vec::new() };

        Ok(ParsedGameContent {
            title,
            description,
            instructions,
            features,
            tags,
            category,
            thumbnail,
            game_url,
            rating,
            developer,
            links,
            images,
        })
    }
}

/// Runs a profile extraction and scores it, catching panics
///
/// `generic` applies the fallback parser's score and confidence discount.
pub fn run_profile(
    parser_name: &str,
    profile: &SiteProfile,
    html: &str,
    url: &str,
    config: &ParseConfig,
    generic: bool,
) -> ParseResult {
    let started = Instant::now();

    let outcome = catch_unwind(AssertUnwindSafe(|| profile.extract(html, url, config)));

    match outcome {
        Ok(Ok(content)) => {
            let (score, confidence) = score_content(&content, generic);
            tracing::debug!(
                "{} parsed {} (score {}, confidence {:.2})",
                parser_name,
                url,
                score,
                confidence
            );
            ParseResult::success(parser_name, content, score, confidence, started.elapsed())
        }
        Ok(Err(error)) => {
            tracing::warn!("{} failed to parse {}: {}", parser_name, url, error);
            ParseResult::failure(parser_name, error, started.elapsed())
        }
        Err(panic) => {
            let error = format!("parser panicked: {}", panic_message(panic.as_ref()));
            tracing::error!("{} failed to parse {}: {}", parser_name, url, error);
            ParseResult::failure(parser_name, error, started.elapsed())
        }
    }
}

pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Caller-supplied selectors, parsed up front
struct CustomSelectors {
    by_field: HashMap<String, Selector>,
}

impl CustomSelectors {
    fn parse(config: &ParseConfig) -> Result<Self, String> {
        let mut by_field = HashMap::new();
        if let Some(custom) = &config.custom_selectors {
            for (field, css) in custom {
                if !FIELDS.contains(&field.as_str()) {
                    tracing::debug!("Ignoring custom selector for unknown field '{}'", field);
                    continue;
                }
                let selector = Selector::parse(css)
                    .map_err(|_| format!("invalid custom selector for {field}: '{css}'"))?;
                by_field.insert(field.clone(), selector);
            }
        }
        Ok(Self { by_field })
    }

    fn text(&self, doc: &PageDocument, field: &str) -> Option<String> {
        self.by_field.get(field).and_then(|s| doc.text_of(s))
    }

    fn texts(&self, doc: &PageDocument, field: &str) -> Option<Vec<String>> {
        self.by_field.get(field).map(|s| doc.texts_of(s))
    }

    fn url(&self, doc: &PageDocument, field: &str) -> Option<String> {
        self.by_field.get(field).and_then(|s| doc.url_of(s))
    }
}

fn first_long_paragraph(doc: &PageDocument) -> Option<String> {
    doc.paragraphs()
        .into_iter()
        .find(|p| p.chars().count() >= MIN_DESCRIPTION_PARAGRAPH)
}

fn control_paragraphs(doc: &PageDocument) -> Option<String> {
    let found: Vec<String> = doc
        .paragraphs()
        .into_iter()
        .filter(|p| {
            let lower = p.to_lowercase();
            CONTROL_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .take(MAX_INSTRUCTION_PARAGRAPHS)
        .collect();

    if found.is_empty() {
        None
    } else {
        doc.finish_text(&found.join(" "))
    }
}

fn meta_keywords(doc: &PageDocument) -> Vec<String> {
    let Some(keywords) = doc.meta(&["keywords"]) else {
        return Vec::new();
    };
    let mut seen = std::collections::HashSet::new();
    keywords
        .split(',')
        .filter_map(|k| doc.finish_text(k))
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect()
}
