use crate::extract::types::{ParseConfig, ParseResult};
use crate::url::{host_of, matches_any_domain};

/// A page parser for one family of sites
///
/// Implementations never fail: every problem is reported through an
/// unsuccessful [`ParseResult`].
pub trait ContentParser: Send + Sync {
    /// Unique name, used for registration and reporting
    fn name(&self) -> &str;

    /// Domain patterns this parser handles (`"poki.com"`, `"*.itch.io"`)
    fn domains(&self) -> &[&str];

    /// Whether this parser handles the given page URL
    fn can_parse(&self, url: &str) -> bool {
        match host_of(url) {
            Ok(host) => matches_any_domain(self.domains(), &host),
            Err(_) => false,
        }
    }

    /// Extracts structured content from a page
    fn parse(&self, html: &str, url: &str, config: &ParseConfig) -> ParseResult;
}
