//! Content extraction module for Rival-Harvest
//!
//! This module handles:
//! - Dispatching fetched pages to a site-specific parser or the generic fallback
//! - A selector cascade per field: custom selectors, site selectors, page
//!   metadata and JSON-LD, then text heuristics
//! - Text cleaning and rating normalization
//! - Quality scoring of the extracted content

mod document;
mod extractor;
mod parsers;
mod profile;
mod score;
mod text;
mod traits;
mod types;

pub use document::{resolve_link, PageDocument};
pub use extractor::{ContentExtractor, GENERIC_PARSER};
pub use parsers::{CrazyGamesParser, GenericParser, ItchParser, PokiParser};
pub use profile::{run_profile, SiteProfile};
pub use score::{quality_score, score_content, GENERIC_CONFIDENCE_FACTOR, GENERIC_SCORE_FACTOR};
pub use text::{clean_text, normalize_rating, truncate_chars};
pub use traits::ContentParser;
pub use types::{ParseConfig, ParseResult, ParsedGameContent};
