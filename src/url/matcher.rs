/// Checks whether a host belongs to a parser's declared domain
///
/// Patterns come in two forms:
/// 1. Plain: `"poki.com"` matches `poki.com` and `www.poki.com`
/// 2. Wildcard: `"*.itch.io"` matches `itch.io` and any subdomain of it
///
/// Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use rival_harvest::url::matches_domain;
///
/// assert!(matches_domain("poki.com", "www.poki.com"));
/// assert!(!matches_domain("poki.com", "games.poki.com"));
/// assert!(matches_domain("*.itch.io", "someone.itch.io"));
/// assert!(!matches_domain("*.itch.io", "notitch.io"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let host = host.to_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        let bare = host.strip_prefix("www.").unwrap_or(&host);
        bare == pattern || host == pattern
    }
}

/// Returns true if the host matches any of the patterns
pub fn matches_any_domain(patterns: &[&str], host: &str) -> bool {
    patterns.iter().any(|pattern| matches_domain(pattern, host))
}
