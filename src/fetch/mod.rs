//! Fetch strategy chain for Pagesift
//!
//! This module retrieves raw page markup through an ordered list of strategies:
//! - [`rendered_fetch`]: drives a rendering engine through [`RenderSession`]
//! - [`plain_fetch`]: plain HTTP through [`HttpTransport`], with per-failure retry policies
//! - [`fetch_page`]: runs both and keeps the result with the longer sanitized text
//!
//! The rendering engine and HTTP client are capabilities supplied by the
//! caller's [`ScrapeContext`](crate::crawler::ScrapeContext).

mod chain;
mod charset;
mod plain;
mod render;
mod rendered;
mod transport;
#[cfg(feature = "webdriver")]
mod webdriver;

pub use chain::{choose_longer, fetch_page, MIN_RENDERED_TEXT_LENGTH};
pub use charset::{decode_html, detect_encoding};
pub use plain::{is_document_content_type, plain_fetch};
pub use render::{
    blocked_url_patterns, RenderLauncher, RenderSession, ResourceKind, BLOCKED_RESOURCES,
    SCROLL_SCRIPT,
};
pub use rendered::{rendered_fetch, SCROLL_SETTLE};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, HttpTransportFactory, ReqwestTransport,
    ReqwestTransportFactory, TransportError,
};
#[cfg(feature = "webdriver")]
pub use webdriver::{WebDriverLauncher, WebDriverSession};

use crate::FetchError;
use rand::Rng;
use std::time::Duration;

/// Backoff windows applied between plain HTTP attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Wait window after an HTTP 429, in seconds
    pub rate_limit_backoff: (f64, f64),

    /// Wait window after a timeout or connection failure, in seconds
    pub transient_backoff: (f64, f64),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_backoff: (10.0, 20.0),
            transient_backoff: (2.0, 5.0),
        }
    }
}

/// Settings for one fetch or crawl invocation
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Attempt the rendering engine before plain HTTP
    pub render_capable: bool,

    /// Send the extended browser header set
    pub stealth: bool,

    /// Upper bound for one request or navigation
    pub timeout: Duration,

    /// Maximum plain HTTP attempts per URL
    pub retry_attempts: u32,

    /// Pacing delay window between crawl requests, in seconds
    pub delay_range: (f64, f64),

    /// Upper bound for the rendering engine's content-ready wait
    pub render_wait: Duration,

    /// Bytes of an HTML body read before the rest is dropped
    pub max_body_bytes: usize,

    pub retry: RetryPolicy,
}

/// Default cap on HTML body size
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            render_capable: false,
            stealth: true,
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            delay_range: (2.0, 5.0),
            render_wait: Duration::from_millis(5000),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            retry: RetryPolicy::default(),
        }
    }
}

/// Raw output of one successful strategy attempt
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    pub status_code: u16,
    pub raw_markup: String,

    /// True if the rendering engine produced the markup
    pub rendered: bool,

    pub duration: Duration,

    /// Live document title reported by the rendering engine
    pub title: Option<String>,

    /// Transport response headers; empty for rendered results
    pub headers: Vec<(String, String)>,
}

/// The chain's chosen result together with its sanitized text
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub result: FetchResult,
    pub text: String,
}

impl FetchedPage {
    /// Length of the sanitized text in characters
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Draws a duration uniformly from a window given in seconds
///
/// Degenerate or inverted windows collapse to their lower bound. Values too
/// large for a `Duration` saturate at `Duration::MAX`.
pub fn random_duration<R: Rng + ?Sized>(rng: &mut R, window: (f64, f64)) -> Duration {
    let (min, max) = window;
    let min = if min.is_finite() { min.max(0.0) } else { 0.0 };
    let secs = if max.is_finite() && max > min {
        rng.gen_range(min..=max)
    } else {
        min
    };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Maps a timed-out capability call to a strategy failure
pub(crate) fn timed_out(url: &str, limit: Duration) -> FetchError {
    FetchError::Network {
        kind: crate::NetworkFailure::Timeout,
        url: url.to_string(),
        message: format!("no response within {:?}", limit),
    }
}
