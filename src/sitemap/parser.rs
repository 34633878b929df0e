//! Sitemap XML parsing
//!
//! Understands the sitemaps.org `urlset` and `sitemapindex` documents.
//! Namespaces are ignored; elements are matched on their local name.

use roxmltree::{Document, Node};
use thiserror::Error;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Page URLs from `<urlset><url><loc>`
    UrlSet(Vec<String>),
    /// Child sitemap URLs from `<sitemapindex><sitemap><loc>`
    Index(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SitemapParseError {
    #[error("empty sitemap")]
    Empty,

    #[error("malformed sitemap XML: {0}")]
    Malformed(String),

    #[error("unrecognized sitemap root element <{0}>")]
    UnrecognizedRoot(String),
}

/// Parses a sitemap or sitemap index
///
/// # Returns
///
/// * `Ok(SitemapDocument)` - The `<loc>` values in document order
/// * `Err(SitemapParseError)` - Empty body, malformed XML or an unknown root
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapParseError> {
    let xml = xml.trim_start_matches('\u{feff}').trim();
    if xml.is_empty() {
        return Err(SitemapParseError::Empty);
    }

    let doc = Document::parse(xml).map_err(|e| SitemapParseError::Malformed(e.to_string()))?;
    let root = doc.root_element();

    match root.tag_name().name() {
        "urlset" => Ok(SitemapDocument::UrlSet(child_locs(root, "url"))),
        "sitemapindex" => Ok(SitemapDocument::Index(child_locs(root, "sitemap"))),
        other => Err(SitemapParseError::UnrecognizedRoot(other.to_string())),
    }
}

/// `<loc>` text of every `entry` child of `parent`
fn child_locs(parent: Node, entry: &str) -> Vec<String> {
    parent
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == entry)
        .filter_map(|n| {
            n.children()
                .find(|c| c.is_element() && c.tag_name().name() == "loc")
        })
        .filter_map(|loc| loc.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}
