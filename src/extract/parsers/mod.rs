//! Built-in parsers

mod crazygames;
mod generic;
mod itch;
mod poki;

pub use crazygames::CrazyGamesParser;
pub use generic::GenericParser;
pub use itch::ItchParser;
pub use poki::PokiParser;

use crate::extract::profile::SiteProfile;

/// Selector profiles of every built-in parser
pub(crate) fn builtin_profiles() -> [(&'static str, &'static SiteProfile); 4] {
    [
        ("poki", &poki::PROFILE),
        ("crazygames", &crazygames::PROFILE),
        ("itch", &itch::PROFILE),
        ("generic", &generic::PROFILE),
    ]
}
