use crate::UrlError;
use url::Url;

/// Normalizes a URL for use as a crawl key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// Host case is already folded by the parser. Paths and queries are kept
/// byte-for-byte: servers are free to treat `/Page` and `/page`, or
/// `?b=2&a=1` and `?a=1&b=2`, as different documents.
///
/// # Examples
///
/// ```
/// use pagesift::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Returns the URL without its fragment
pub fn strip_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}
