use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pagesift::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share host and effective port
///
/// This is the crawl's notion of "same site": subdomains are distinct sites,
/// and `http://a.com` matches `https://a.com` only if their ports agree.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(host_a), Some(host_b)) => {
            host_a == host_b && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}
