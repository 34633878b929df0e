//! Capped LRU response cache

use crate::fetch::types::{FetchMethod, FetchResponse};
use std::collections::{BTreeMap, HashMap, VecDeque};
use url::Url;

/// Headers that never change what the server returns for our purposes
const IGNORED_HEADERS: &[&str] = &["user-agent", "cache-control", "pragma"];

/// Builds the cache key of a request
///
/// The key covers the method, the normalized URL (lowercase host, explicit
/// root path) and the caller headers, except identity and caching headers.
pub fn cache_key(method: FetchMethod, url: &str, headers: &BTreeMap<String, String>) -> String {
    let normalized = Url::parse(url.trim())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.trim().to_string());

    let mut relevant: Vec<(String, &str)> = headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.as_str()))
        .filter(|(k, _)| !IGNORED_HEADERS.contains(&k.as_str()))
        .collect();
    relevant.sort();

    let mut key = format!("{} {}", method.as_str(), normalized);
    for (name, value) in relevant {
        key.push_str(&format!("\n{name}: {value}"));
    }
    key
}

/// Response cache holding at most `capacity` entries
///
/// Reads refresh recency; inserting past capacity evicts the least
/// recently used entry.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    entries: HashMap<String, FetchResponse>,
    order: VecDeque<String>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<FetchResponse> {
        let response = self.entries.get(key)?.clone();
        self.touch(key);
        Some(response)
    }

    pub fn insert(&mut self, key: String, response: FetchResponse) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.insert(key.clone(), response).is_some() {
            self.touch(&key);
            return;
        }

        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content: &str) -> FetchResponse {
        FetchResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
            content: content.to_string(),
            final_url: "https://poki.com/".to_string(),
            from_cache: false,
            response_time_ms: 5,
        }
    }

    #[test]
    fn test_cache_key_normalizes_url_and_ignores_identity() {
        let mut a = BTreeMap::new();
        a.insert("User-Agent".to_string(), "Bot/1".to_string());
        a.insert("Accept".to_string(), "text/html".to_string());

        let mut b = BTreeMap::new();
        b.insert("accept".to_string(), "text/html".to_string());
        b.insert("user-agent".to_string(), "Bot/2".to_string());

        assert_eq!(
            cache_key(FetchMethod::Get, "https://POKI.com", &a),
            cache_key(FetchMethod::Get, " https://poki.com/ ", &b)
        );
    }

    #[test]
    fn test_cache_key_distinguishes_method_and_headers() {
        let empty = BTreeMap::new();
        let mut lang = BTreeMap::new();
        lang.insert("Accept-Language".to_string(), "de".to_string());

        let base = cache_key(FetchMethod::Get, "https://poki.com/", &empty);
        assert_ne!(base, cache_key(FetchMethod::Head, "https://poki.com/", &empty));
        assert_ne!(base, cache_key(FetchMethod::Get, "https://poki.com/", &lang));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ResponseCache::new(2);
        cache.insert("a".to_string(), response("a"));
        cache.insert("b".to_string(), response("b"));

        // Touch "a" so "b" becomes least recently used
        assert!(cache.get("a").is_some());
        cache.insert("c".to_string(), response("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_reinsert_replaces_without_growing() {
        let mut cache = ResponseCache::new(2);
        cache.insert("a".to_string(), response("1"));
        cache.insert("a".to_string(), response("2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().content, "2");
    }

    #[test]
    fn test_clear() {
        let mut cache = ResponseCache::new(4);
        cache.insert("a".to_string(), response("a"));
        cache.clear();
        cache.clear();
        assert!(cache.is_empty());
    }
}
