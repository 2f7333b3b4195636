//! Pagesift: resilient page retrieval and content extraction
//!
//! This crate fetches web pages through a chain of strategies (a rendering
//! engine and a plain HTTP client), strips boilerplate to recover the main
//! text, collects structured metadata, and drives a bounded same-site crawl.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod identity;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Pagesift operations
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Insufficient content at {url}: {length} characters extracted")]
    InsufficientContent { url: String, length: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Kinds of transport-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    Timeout,
    ConnectionError,
}

impl std::fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkFailure::Timeout => write!(f, "timeout"),
            NetworkFailure::ConnectionError => write!(f, "connection error"),
        }
    }
}

/// Failures raised while fetching a single URL
///
/// Every variant except [`FetchError::AllStrategiesExhausted`] is handled
/// inside the strategy chain; only the terminal variant reaches callers.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network failure ({kind}) for {url}: {message}")]
    Network {
        kind: NetworkFailure,
        url: String,
        message: String,
    },

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Content type rejected for {url}: {content_type}")]
    ContentTypeRejected { url: String, content_type: String },

    #[error("Insufficient content: {length} characters")]
    InsufficientContent { length: usize },

    #[error("Rendering engine failure: {0}")]
    RenderEngine(String),

    #[error("All fetch strategies exhausted for {url} after {attempts} attempts")]
    AllStrategiesExhausted { url: String, attempts: u32 },
}

/// Result type alias for Pagesift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    crawl, fetch_document, CrawlConfig, CrawlReport, CrawlSummary, ScrapeContext, Scraper,
};
pub use extract::{ExtractedDocument, Metadata};
pub use fetch::{FetchConfig, FetchResult, FetchedPage};
pub use identity::{Identity, IdentityManager};
