//! Sitemap discovery
//!
//! Turns a competitor's `sitemap.xml` (or sitemap index) into a
//! `SitemapSnapshot` of its candidate game pages.

mod parser;
mod reader;
mod traits;
mod types;

pub use parser::{parse_sitemap, SitemapDocument, SitemapParseError};
pub use reader::{SitemapError, SitemapReader, DEFAULT_MAX_DEPTH};
pub use traits::SitemapSource;
pub use types::{SitemapSnapshot, SnapshotStatus};
