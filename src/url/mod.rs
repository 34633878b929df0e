//! URL handling module for Rival-Harvest
//!
//! This module provides host extraction, parser domain matching and the
//! sitemap URL filter.

mod domain;
mod filter;
mod matcher;

pub use domain::{extract_domain, host_of, parse_http_url};
pub use filter::{UrlFilter, DEFAULT_MAX_PAGES};
pub use matcher::{matches_any_domain, matches_domain};
