use crate::extract::images::{extract_images, ImageRef};
use crate::extract::metadata::{metadata_from_document, Metadata};
use crate::fetch::FetchedPage;
use crate::url::LinkFilter;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

/// The clean, structured result of retrieving one page
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    pub status_code: u16,
    pub title: Option<String>,

    /// Whitespace-normalized, boilerplate-filtered main text
    pub text: String,

    pub metadata: Metadata,

    /// Same-site, fragment-free, deduplicated absolute URLs
    pub links: Vec<String>,

    pub images: Vec<ImageRef>,

    /// Link distance from the crawl's start URL
    pub depth: u32,

    /// Whether the rendering engine produced the markup
    pub rendered: bool,

    /// Wall-clock time spent fetching, in milliseconds
    pub duration_ms: u64,

    pub fetched_at: DateTime<Utc>,
}

impl ExtractedDocument {
    /// Builds a document from a fetched page
    ///
    /// # Arguments
    ///
    /// * `page` - Output of the fetch chain, including its sanitized text
    /// * `depth` - Link distance from the start URL
    /// * `link_filter` - Filter deciding which discovered links are kept
    pub fn from_page(page: FetchedPage, depth: u32, link_filter: &LinkFilter) -> Self {
        let FetchedPage { result, text } = page;
        let document = Html::parse_document(&result.raw_markup);

        let base_url = Url::parse(&result.final_url)
            .or_else(|_| Url::parse(&result.url))
            .unwrap_or_else(|_| link_filter.origin().clone());

        let headers = (!result.rendered).then_some(result.headers.as_slice());
        let metadata = metadata_from_document(&document, headers);
        let links = link_filter.filter(extract_hrefs(&document), &base_url);
        let images = extract_images(&document, &base_url);

        let title = result
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| metadata.title.clone());

        Self {
            url: result.url,
            final_url: result.final_url,
            status_code: result.status_code,
            title,
            text,
            metadata,
            links,
            images,
            depth,
            rendered: result.rendered,
            duration_ms: u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            fetched_at: Utc::now(),
        }
    }

    /// Length of the main text in characters
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Returns the `href` of every followable anchor, in document order
///
/// Anchors carrying the `download` attribute are skipped. `rel="nofollow"`
/// links are still returned.
pub fn extract_hrefs(document: &Html) -> Vec<&str> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .collect()
}
