//! Page metadata extraction
//!
//! Collects `<meta>` pairs, Open Graph and Twitter card properties, JSON-LD
//! structured data, and technical details from the transport headers.

use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured metadata for one page; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub canonical_url: Option<String>,
    pub language: Option<String>,

    /// `<meta name=... content=...>` pairs keyed by lowercased name
    pub basic: BTreeMap<String, String>,

    /// Open Graph properties keyed by the part after `og:`
    pub open_graph: BTreeMap<String, String>,

    /// Twitter card properties keyed by the part after `twitter:`
    pub twitter: BTreeMap<String, String>,

    /// Every well-formed JSON-LD block, in document order
    pub structured_data: Vec<serde_json::Value>,

    /// Present only when transport headers were supplied
    pub technical: Option<TechnicalMetadata>,
}

/// Response details taken from transport headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TechnicalMetadata {
    pub content_type: Option<String>,
    pub server: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<String>,
    pub content_encoding: Option<String>,
}

/// Problems found while reading metadata
///
/// These never escape [`extract_metadata`]; they are logged and the
/// offending block is skipped.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Malformed structured data block #{index}: {source}")]
    MalformedStructuredDataBlock {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Extracts metadata from raw markup
///
/// # Arguments
///
/// * `raw_markup` - The page markup
/// * `headers` - Transport response headers, if the page came over HTTP
pub fn extract_metadata(raw_markup: &str, headers: Option<&[(String, String)]>) -> Metadata {
    let document = Html::parse_document(raw_markup);
    metadata_from_document(&document, headers)
}

/// Extracts metadata from an already parsed document
pub fn metadata_from_document(document: &Html, headers: Option<&[(String, String)]>) -> Metadata {
    let mut metadata = Metadata::default();

    collect_meta_tags(document, &mut metadata);
    metadata.structured_data = collect_structured_data(document);

    metadata.title = first_text(document, "title")
        .or_else(|| metadata.open_graph.get("title").cloned());
    metadata.description = metadata
        .basic
        .get("description")
        .or_else(|| metadata.open_graph.get("description"))
        .cloned();
    metadata.keywords = metadata.basic.get("keywords").cloned();
    metadata.author = metadata.basic.get("author").cloned();
    metadata.canonical_url = first_attr(document, "link[rel~=\"canonical\"][href]", "href");
    metadata.language = first_attr(document, "html[lang]", "lang");

    metadata.technical = headers.map(technical_metadata);

    metadata
}

fn collect_meta_tags(document: &Html, metadata: &mut Metadata) {
    let Ok(selector) = Selector::parse("meta[content]") else {
        return;
    };

    for element in document.select(&selector) {
        let value = element.value();
        let Some(content) = value.attr("content").map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };

        if let Some(property) = value.attr("property") {
            let property = property.trim().to_lowercase();
            if let Some(key) = property.strip_prefix("og:") {
                metadata
                    .open_graph
                    .insert(key.to_string(), content.to_string());
            } else if let Some(key) = property.strip_prefix("twitter:") {
                metadata
                    .twitter
                    .entry(key.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }

        if let Some(name) = value.attr("name") {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            if let Some(key) = name.strip_prefix("twitter:") {
                metadata
                    .twitter
                    .insert(key.to_string(), content.to_string());
            } else {
                metadata.basic.insert(name, content.to_string());
            }
        }
    }
}

fn collect_structured_data(document: &Html) -> Vec<serde_json::Value> {
    let Ok(selector) = Selector::parse("script[type=\"application/ld+json\"]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .enumerate()
        .filter_map(|(index, element)| {
            let raw: String = element.text().collect();
            match parse_structured_block(index, &raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping structured data: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Parses one JSON-LD block
pub fn parse_structured_block(index: usize, raw: &str) -> Result<serde_json::Value, MetadataError> {
    serde_json::from_str(raw.trim())
        .map_err(|source| MetadataError::MalformedStructuredDataBlock { index, source })
}

fn technical_metadata(headers: &[(String, String)]) -> TechnicalMetadata {
    let lookup = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    };

    TechnicalMetadata {
        content_type: lookup("content-type"),
        server: lookup("server"),
        last_modified: lookup("last-modified"),
        content_length: lookup("content-length"),
        content_encoding: lookup("content-encoding"),
    }
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
