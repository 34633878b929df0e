use crate::url::domain::{extract_domain, host_of, parse_http_url};
use crate::{UrlError, UrlResult};
use regex::{Regex, RegexSet};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Default number of URLs kept per snapshot when a site sets no `max-pages`
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Path patterns never treated as game pages
///
/// Matched case-insensitively against the URL path only.
const EXCLUDED_PATHS: &[&str] = &[
    // Feeds
    r"^/(feed|rss|atom)(/|$)",
    r"/feed/?$",
    r"\.(rss|atom)$",
    // APIs
    r"^/(api|wp-json|graphql)(/|$)",
    // Admin and account areas
    r"^/(admin|wp-admin|login|logout|signin|signup|register|account|cart|checkout)(/|$)",
    // Static assets
    r"^/(static|assets|_next|cdn-cgi|wp-content|wp-includes)(/|$)",
    r"\.(css|js|mjs|json|xml|txt|pdf|zip|rar|gz|png|jpe?g|gif|svg|webp|avif|ico|bmp|mp3|mp4|webm|woff2?|ttf|eot)$",
];

fn excluded_paths() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        let patterns: Vec<String> = EXCLUDED_PATHS.iter().map(|p| format!("(?i){p}")).collect();
        RegexSet::new(patterns).unwrap_or_else(|_| RegexSet::empty())
    })
}

/// Decides which sitemap URLs belong in a site's snapshot
///
/// A URL is kept when its host equals the site's base host and either
/// - it matches the site's `url_pattern`, when one is configured, or
/// - its path matches none of the default exclusions.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    host: String,
    pattern: Option<Regex>,
}

impl UrlFilter {
    /// Builds a filter for a site
    ///
    /// # Arguments
    ///
    /// * `base_url` - The site's base URL; its host is the only host kept
    /// * `url_pattern` - Optional regex replacing the default exclusion list
    ///
    /// # Returns
    ///
    /// * `Ok(UrlFilter)` - Ready to use
    /// * `Err(UrlError)` - The base URL or the pattern is invalid
    pub fn new(base_url: &str, url_pattern: Option<&str>) -> UrlResult<Self> {
        let host = host_of(base_url)?;

        let pattern = url_pattern
            .map(|p| Regex::new(p).map_err(|e| UrlError::InvalidPattern(format!("{p}: {e}"))))
            .transpose()?;

        Ok(Self { host, pattern })
    }

    /// Returns true if the URL should be kept
    pub fn allows(&self, url_str: &str) -> bool {
        let Ok(url) = parse_http_url(url_str) else {
            return false;
        };

        if extract_domain(&url).as_deref() != Some(self.host.as_str()) {
            return false;
        }

        match &self.pattern {
            Some(pattern) => pattern.is_match(url_str.trim()),
            None => !excluded_paths().is_match(url.path()),
        }
    }

    /// Filters, deduplicates, orders and truncates a URL list
    ///
    /// Shorter paths sort first (they are the likeliest canonical game pages),
    /// ties are broken lexicographically on the full URL.
    pub fn apply<I>(&self, urls: I, max_pages: usize) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let mut kept: Vec<(usize, String)> = urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| self.allows(u))
            .filter(|u| seen.insert(u.clone()))
            .map(|u| (path_length(&u), u))
            .collect();

        kept.sort();
        kept.truncate(max_pages);
        kept.into_iter().map(|(_, u)| u).collect()
    }
}

fn path_length(url_str: &str) -> usize {
    parse_http_url(url_str)
        .map(|u| u.path().len())
        .unwrap_or(usize::MAX)
}
