use crate::extract::profile::{run_profile, SiteProfile};
use crate::extract::traits::ContentParser;
use crate::extract::types::{ParseConfig, ParseResult};

pub(crate) const PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1[data-testid='game-title']",
        "[class*='GameTitle']",
        ".game-title h1",
        "h1",
    ],
    description: &[
        "[data-testid='game-description']",
        "[class*='GameDescription'] p",
        ".game-description",
    ],
    instructions: &[
        "[data-testid='game-controls']",
        "[class*='GameControls']",
        ".game-instructions",
    ],
    features: &["[class*='GameFeatures'] li", ".game-features li"],
    tags: &[
        "[data-testid='game-tags'] a",
        "[class*='GameTags'] a",
        ".game-tags a",
    ],
    category: &["[data-testid='breadcrumbs'] li:nth-child(2) a", "[class*='Breadcrumb'] a"],
    thumbnail: &["[data-testid='game-thumbnail'] img", "[class*='GameThumbnail'] img"],
    rating: &["[data-testid='game-rating']", "[class*='Rating'] [class*='Value']"],
    developer: &["[data-testid='game-developer']", "[class*='Developer'] a"],
    game_frame: &["iframe#game-element", "iframe[class*='GameFrame']"],
};

/// Parser for poki.com game pages
#[derive(Debug, Default)]
pub struct PokiParser;

impl ContentParser for PokiParser {
    fn name(&self) -> &str {
        "poki"
    }

    fn domains(&self) -> &[&str] {
        &["poki.com"]
    }

    fn parse(&self, html: &str, url: &str, config: &ParseConfig) -> ParseResult {
        run_profile(self.name(), &PROFILE, html, url, config, false)
    }
}
