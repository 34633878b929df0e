use crate::extract::profile::{run_profile, SiteProfile};
use crate::extract::traits::ContentParser;
use crate::extract::types::{ParseConfig, ParseResult};

pub(crate) const PROFILE: SiteProfile = SiteProfile {
    title: &["h1.game_title", ".game_title", "h1"],
    description: &[".formatted_description", ".game_description", "#game_description"],
    instructions: &[".game_controls", ".controls_section"],
    features: &[".formatted_description ul li"],
    tags: &[".game_info_panel_widget a[href*='/tag-']", ".tags a"],
    category: &[".game_info_panel_widget a[href*='/genre-']"],
    thumbnail: &[".header_image img", ".screenshot_list img"],
    rating: &[".aggregate_rating", "[itemprop='ratingValue']"],
    developer: &[".game_info_panel_widget a[href$='.itch.io']", ".user_link"],
    game_frame: &["iframe#game_drop", ".iframe_placeholder iframe", "#html_embed iframe"],
};

/// Parser for game pages hosted on itch.io
#[derive(Debug, Default)]
pub struct ItchParser;

impl ContentParser for ItchParser {
    fn name(&self) -> &str {
        "itch"
    }

    fn domains(&self) -> &[&str] {
        &["*.itch.io"]
    }

    fn parse(&self, html: &str, url: &str, config: &ParseConfig) -> ParseResult {
        run_profile(self.name(), &PROFILE, html, url, config, false)
    }
}
