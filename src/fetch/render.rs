//! Rendering capability
//!
//! A rendering engine is consumed through two traits: [`RenderLauncher`]
//! starts a session, and [`RenderSession`] drives one browser page. The
//! crate ships a WebDriver implementation behind the `webdriver` feature.

use crate::identity::Identity;
use crate::FetchError;
use async_trait::async_trait;
use std::fmt;

/// Sub-resource categories a session can refuse to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Stylesheet,
    Font,
    Media,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Image => "image",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Font => "font",
            ResourceKind::Media => "media",
        };
        write!(f, "{}", name)
    }
}

impl ResourceKind {
    /// URL wildcard patterns matching this kind of resource
    pub fn url_patterns(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Image => &[
                "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.avif", "*.svg", "*.ico", "*.bmp",
            ],
            ResourceKind::Stylesheet => &["*.css"],
            ResourceKind::Font => &["*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot"],
            ResourceKind::Media => &[
                "*.mp4", "*.webm", "*.ogg", "*.mp3", "*.wav", "*.m4a", "*.mov", "*.avi",
            ],
        }
    }
}

/// URL patterns covering every kind in `kinds`, without duplicates
pub fn blocked_url_patterns(kinds: &[ResourceKind]) -> Vec<&'static str> {
    let mut patterns: Vec<&'static str> = Vec::new();
    for kind in kinds {
        for pattern in kind.url_patterns() {
            if !patterns.contains(pattern) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}

/// Non-document resources blocked before every navigation
pub const BLOCKED_RESOURCES: &[ResourceKind] = &[
    ResourceKind::Image,
    ResourceKind::Stylesheet,
    ResourceKind::Font,
    ResourceKind::Media,
];

/// Scrolls to the bottom in steps so lazily loaded content is requested
pub const SCROLL_SCRIPT: &str = r#"
return new Promise((resolve) => {
    let travelled = 0;
    const step = 100;
    const timer = setInterval(() => {
        window.scrollBy(0, step);
        travelled += step;
        if (travelled >= document.body.scrollHeight || travelled >= 50000) {
            clearInterval(timer);
            resolve(travelled);
        }
    }, 100);
});
"#;

/// Starts rendering sessions
#[async_trait]
pub trait RenderLauncher: Send + Sync {
    /// Launches a session presenting the given identity
    async fn launch(&self, identity: &Identity) -> Result<Box<dyn RenderSession>, FetchError>;
}

/// One live browser page
///
/// Every method may fail with [`FetchError::RenderEngine`]; callers bound
/// each call with their own timeout.
#[async_trait]
pub trait RenderSession: Send + Sync {
    async fn block_resource_types(&mut self, kinds: &[ResourceKind]) -> Result<(), FetchError>;

    async fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Waits for the document to report ready, giving up quietly after `max_wait`
    async fn wait_ready(&mut self, max_wait: std::time::Duration) -> Result<(), FetchError>;

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, FetchError>;

    /// Current serialized markup
    async fn content(&mut self) -> Result<String, FetchError>;

    async fn title(&mut self) -> Result<Option<String>, FetchError>;

    /// Current URL, after any redirects or client-side navigation
    async fn url(&mut self) -> Result<String, FetchError>;

    async fn close(&mut self) -> Result<(), FetchError>;
}
