use crate::url::domain::same_site;
use std::collections::HashSet;
use url::Url;

/// File extensions that never lead to a text document
pub const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    // Documents that are not HTML
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".webp", ".bmp", ".tif", ".tiff", ".avif",
    // Media
    ".mp4", ".mp3", ".avi", ".mov", ".wav", ".ogg", ".webm", ".mkv", ".flac",
    // Archives
    ".zip", ".tar", ".gz", ".tgz", ".bz2", ".xz", ".rar", ".7z",
    // Executables and installers
    ".exe", ".dmg", ".msi", ".apk", ".deb", ".rpm", ".bin", ".iso",
];

/// Default cap on query-string length
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 200;

/// Default cap on links surfaced from one page
pub const DEFAULT_MAX_LINKS: usize = 50;

/// Resolves and filters discovered hrefs against a crawl origin
///
/// The same filter is used when a page's links are extracted and when the
/// crawl expands its frontier, so both views agree on which URLs exist.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    origin: Url,
    max_query_length: usize,
    max_links: usize,
}

impl LinkFilter {
    /// Creates a filter that keeps links on `origin`'s site
    pub fn new(origin: &Url) -> Self {
        Self {
            origin: origin.clone(),
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            max_links: DEFAULT_MAX_LINKS,
        }
    }

    /// Overrides the query-string length cap
    pub fn with_max_query_length(mut self, max_query_length: usize) -> Self {
        self.max_query_length = max_query_length;
        self
    }

    /// Overrides the per-page link cap
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// The URL whose site links must belong to
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolves one href and applies every filter rule
    ///
    /// Returns `None` when the link should be dropped:
    /// - empty, `javascript:`, `mailto:`, `tel:`, `data:` or fragment-only hrefs
    /// - non-HTTP(S) results
    /// - other sites
    /// - queries longer than the cap
    /// - non-document file extensions
    pub fn accept(&self, href: &str, base_url: &Url) -> Option<Url> {
        let mut resolved = resolve_link(href, base_url)?;

        if !same_site(&resolved, &self.origin) {
            return None;
        }

        resolved.set_fragment(None);

        if resolved
            .query()
            .map_or(false, |q| q.len() > self.max_query_length)
        {
            tracing::debug!("Dropping link with oversized query: {}", resolved);
            return None;
        }

        if has_non_document_extension(&resolved) {
            return None;
        }

        Some(resolved)
    }

    /// Filters a sequence of hrefs into deduplicated absolute URLs
    ///
    /// Order of first appearance is preserved and the result is capped at
    /// the filter's link limit.
    pub fn filter<'a, I>(&self, hrefs: I, base_url: &Url) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in hrefs {
            if links.len() >= self.max_links {
                break;
            }

            if let Some(url) = self.accept(href, base_url) {
                let link = url.to_string();
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
        }

        links
    }
}

/// Resolves an href to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}

/// Returns true if the URL path ends in a non-document extension
pub fn has_non_document_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    NON_DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
