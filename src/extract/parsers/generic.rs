use crate::extract::profile::{run_profile, SiteProfile};
use crate::extract::traits::ContentParser;
use crate::extract::types::{ParseConfig, ParseResult};

/// Common markup seen across game portals
pub(crate) const PROFILE: SiteProfile = SiteProfile {
    title: &[
        "h1[itemprop='name']",
        "h1.game-title",
        ".game-title",
        ".game-name",
        "h1",
    ],
    description: &[
        "[itemprop='description']",
        ".game-description",
        ".description",
        "#description",
    ],
    instructions: &[
        ".game-instructions",
        ".instructions",
        ".how-to-play",
        "#how-to-play",
        ".controls",
    ],
    features: &[".game-features li", ".features li"],
    tags: &[".game-tags a", ".tags a", "[rel='tag']"],
    category: &[".game-category", ".category a", "[itemprop='genre']"],
    thumbnail: &["[itemprop='image']", ".game-thumbnail img", ".thumbnail img"],
    rating: &["[itemprop='ratingValue']", ".game-rating", ".rating"],
    developer: &["[itemprop='author']", ".developer", ".game-developer"],
    game_frame: &["iframe#game", "iframe.game", "iframe[src*='game']"],
};

/// Fallback parser for sites without a dedicated parser
///
/// Scores are discounted relative to site parsers.
#[derive(Debug, Default)]
pub struct GenericParser;

impl ContentParser for GenericParser {
    fn name(&self) -> &str {
        "generic"
    }

    fn domains(&self) -> &[&str] {
        &[]
    }

    fn can_parse(&self, _url: &str) -> bool {
        true
    }

    fn parse(&self, html: &str, url: &str, config: &ParseConfig) -> ParseResult {
        run_profile(self.name(), &PROFILE, html, url, config, true)
    }
}
