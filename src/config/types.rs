use serde::Deserialize;

/// Main configuration structure for Pagesift
///
/// Every section is optional; missing sections and keys take the defaults
/// below, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub crawl: CrawlSection,
    #[serde(default)]
    pub identity: IdentitySection,
    #[serde(default)]
    pub patterns: PatternSection,
}

/// Fetch strategy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Attempt the rendering engine before the plain HTTP path
    #[serde(rename = "render")]
    pub render: bool,

    /// Send the extended browser header set
    #[serde(rename = "stealth")]
    pub stealth: bool,

    /// Upper bound for a single request or navigation (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum number of plain HTTP attempts per URL
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Minimum pacing delay between crawl requests (seconds)
    #[serde(rename = "delay-min-secs")]
    pub delay_min_secs: f64,

    /// Maximum pacing delay between crawl requests (seconds)
    #[serde(rename = "delay-max-secs")]
    pub delay_max_secs: f64,

    /// Upper bound for the rendered content-ready and scroll-settle waits (milliseconds)
    #[serde(rename = "render-wait-ms")]
    pub render_wait_ms: u64,

    /// Backoff window after HTTP 429 (seconds, [min, max])
    #[serde(rename = "rate-limit-backoff")]
    pub rate_limit_backoff: [f64; 2],

    /// Backoff window after a timeout or connection failure (seconds, [min, max])
    #[serde(rename = "transient-backoff")]
    pub transient_backoff: [f64; 2],

    /// WebDriver endpoint used by the rendering engine
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,

    /// Largest HTML body read from a response (bytes)
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            render: false,
            stealth: true,
            timeout_secs: 30,
            retry_attempts: 3,
            delay_min_secs: 2.0,
            delay_max_secs: 5.0,
            render_wait_ms: 5_000,
            rate_limit_backoff: [10.0, 20.0],
            transient_backoff: [2.0, 5.0],
            webdriver_url: "http://localhost:9515".to_string(),
            max_body_bytes: crate::fetch::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Crawl budget configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    /// Maximum number of documents captured per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum link depth from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of links enqueued from a single page
    #[serde(rename = "links-per-page")]
    pub links_per_page: usize,

    /// Minimum sanitized text length for a page to count as captured
    #[serde(rename = "min-document-length")]
    pub min_document_length: usize,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
            links_per_page: 10,
            min_document_length: 50,
        }
    }
}

/// Identity pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    /// User agents to rotate through (empty means the built-in pool)
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header value
    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            user_agents: Vec::new(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// Overrides for the sanitizer pattern tables
///
/// A missing key keeps the built-in table; a present key replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatternSection {
    /// CSS selectors removed before content location
    #[serde(rename = "removed-selectors")]
    pub removed_selectors: Option<Vec<String>>,

    /// Class/id substrings marking boilerplate elements
    #[serde(rename = "denied-substrings")]
    pub denied_substrings: Option<Vec<String>>,

    /// Ordered locator strategies, each a list of CSS selectors
    #[serde(rename = "locator-strategies")]
    pub locator_strategies: Option<Vec<Vec<String>>>,

    /// Regular expressions for lines dropped from the final text
    #[serde(rename = "skip-line-patterns")]
    pub skip_line_patterns: Option<Vec<String>>,
}
