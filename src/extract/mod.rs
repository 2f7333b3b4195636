//! Content extraction for Pagesift
//!
//! This module turns raw page markup into an [`ExtractedDocument`]:
//! - [`Sanitizer`] recovers the main text, driven by [`PatternTables`]
//! - [`extract_metadata`] reads meta tags, social cards and JSON-LD
//! - [`extract_images`] lists referenced images

mod document;
mod images;
mod metadata;
mod patterns;
mod sanitizer;

pub use document::{extract_hrefs, ExtractedDocument};
pub use images::{extract_images, ImageRef, MAX_IMAGES};
pub use metadata::{
    extract_metadata, metadata_from_document, parse_structured_block, Metadata, MetadataError,
    TechnicalMetadata,
};
pub use patterns::{
    PatternTables, DEFAULT_DENIED_SUBSTRINGS, DEFAULT_LOCATOR_STRATEGIES,
    DEFAULT_REMOVED_SELECTORS, DEFAULT_SKIP_LINE_PATTERNS,
};
pub use sanitizer::{visible_text, Sanitizer};
