use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase host from a parsed URL
///
/// Returns `None` for URLs without a host (e.g. `data:` URLs).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rival_harvest::url::extract_domain;
///
/// let url = Url::parse("https://POKI.com/en/g/subway-surfers").unwrap();
/// assert_eq!(extract_domain(&url), Some("poki.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses an http(s) URL string and returns its lowercase host
///
/// # Returns
///
/// * `Ok(String)` - The host
/// * `Err(UrlError)` - The string is not an absolute http(s) URL with a host
pub fn host_of(url_str: &str) -> UrlResult<String> {
    let url = parse_http_url(url_str)?;
    extract_domain(&url).ok_or_else(|| UrlError::MissingHost(url_str.to_string()))
}

/// Parses a URL string, accepting only the http and https schemes
pub fn parse_http_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(format!("{url_str}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}
