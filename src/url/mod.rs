//! URL handling module for Pagesift
//!
//! This module provides URL normalization, same-site checks, and the link
//! filter shared by page extraction and crawl frontier expansion.

mod domain;
mod links;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_site};
pub use links::{
    has_non_document_extension, resolve_link, LinkFilter, DEFAULT_MAX_LINKS,
    DEFAULT_MAX_QUERY_LENGTH, NON_DOCUMENT_EXTENSIONS,
};
pub use normalize::{normalize_url, strip_fragment};
