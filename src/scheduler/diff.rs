//! Incremental URL diffs between two snapshots

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Difference between a site's previous and current URL sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlDiff {
    /// In current but not in previous
    pub new_urls: Vec<String>,
    /// In both
    pub updated_urls: Vec<String>,
    /// In previous but not in current
    pub removed_urls: Vec<String>,
}

impl UrlDiff {
    /// Computes the diff; output lists follow `current` / `previous` order
    pub fn between(previous: &[String], current: &[String]) -> Self {
        let prev: HashSet<&str> = previous.iter().map(String::as_str).collect();
        let curr: HashSet<&str> = current.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let mut new_urls = Vec::new();
        let mut updated_urls = Vec::new();
        for url in current {
            if !seen.insert(url.as_str()) {
                continue;
            }
            if prev.contains(url.as_str()) {
                updated_urls.push(url.clone());
            } else {
                new_urls.push(url.clone());
            }
        }

        let mut seen = HashSet::new();
        let removed_urls = previous
            .iter()
            .filter(|u| !curr.contains(u.as_str()) && seen.insert(u.as_str()))
            .cloned()
            .collect();

        Self {
            new_urls,
            updated_urls,
            removed_urls,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.new_urls.is_empty() || !self.removed_urls.is_empty()
    }
}
