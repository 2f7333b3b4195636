use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Maximum number of images reported per page
pub const MAX_IMAGES: usize = 30;

/// Attributes that may carry an image source, in priority order
const SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src", "data-lazy-src"];

/// An image referenced by a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    /// Absolute image URL
    pub src: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub loading: Option<String>,
}

/// Collects the images of a document
///
/// Lazy-load attributes are honored, inline `data:` images and tracking
/// pixels are skipped, sources are resolved against `base_url`, and the
/// result is deduplicated and capped at [`MAX_IMAGES`].
pub fn extract_images(document: &Html, base_url: &Url) -> Vec<ImageRef> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for element in document.select(&selector) {
        if images.len() >= MAX_IMAGES {
            break;
        }

        let Some(raw_src) = image_source(&element) else {
            continue;
        };
        if raw_src.to_ascii_lowercase().starts_with("data:") || is_tracking_pixel(&element, raw_src) {
            continue;
        }

        let Ok(resolved) = base_url.join(raw_src) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        let src = resolved.to_string();
        if !seen.insert(src.clone()) {
            continue;
        }

        images.push(ImageRef {
            src,
            alt: attr(&element, "alt"),
            title: attr(&element, "title"),
            width: attr(&element, "width"),
            height: attr(&element, "height"),
            loading: attr(&element, "loading"),
        });
    }

    images
}

fn image_source<'a>(element: &ElementRef<'a>) -> Option<&'a str> {
    SOURCE_ATTRIBUTES
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn is_tracking_pixel(element: &ElementRef, src: &str) -> bool {
    if src.to_ascii_lowercase().contains("pixel") {
        return true;
    }
    let dimension = |name: &str| element.value().attr(name).map(str::trim);
    matches!((dimension("width"), dimension("height")), (Some("1"), Some("1")) | (Some("0"), Some("0")))
}

fn attr(element: &ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
