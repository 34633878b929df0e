use crate::extract::profile::{run_profile, SiteProfile};
use crate::extract::traits::ContentParser;
use crate::extract::types::{ParseConfig, ParseResult};

pub(crate) const PROFILE: SiteProfile = SiteProfile {
    title: &["h1.game-title", "[class*='GameHeader'] h1", "h1"],
    description: &[
        ".game-description",
        "[class*='GameDescription']",
        "#game-description",
    ],
    instructions: &[
        ".game-controls",
        "[class*='Controls']",
        "#game-controls",
    ],
    features: &[".game-features li", "[class*='Features'] li"],
    tags: &[".game-tags a", "[class*='GameTags'] a", ".tags a"],
    category: &[".game-category a", "[class*='Breadcrumbs'] a:nth-of-type(2)"],
    thumbnail: &[".game-thumbnail img", "[class*='GameThumb'] img"],
    rating: &[".game-rating", "[class*='Rating'] span", "[itemprop='ratingValue']"],
    developer: &[".game-developer", "[class*='Developer'] a"],
    game_frame: &["iframe#game-iframe", "iframe.game-iframe", "iframe[data-testid='game-iframe']"],
};

/// Parser for crazygames.com game pages
#[derive(Debug, Default)]
pub struct CrazyGamesParser;

impl ContentParser for CrazyGamesParser {
    fn name(&self) -> &str {
        "crazygames"
    }

    fn domains(&self) -> &[&str] {
        &["crazygames.com"]
    }

    fn parse(&self, html: &str, url: &str, config: &ParseConfig) -> ParseResult {
        run_profile(self.name(), &PROFILE, html, url, config, false)
    }
}
