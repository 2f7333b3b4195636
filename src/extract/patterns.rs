//! Built-in sanitizer tables
//!
//! These are plain data. A configuration file may replace any table as a
//! whole; see `[patterns]` in the config reference.

/// Elements removed before any text is located
pub const DEFAULT_REMOVED_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "object",
    "embed",
    "template",
    "svg",
    "nav",
    "header",
    "footer",
    "aside",
    "[role=\"navigation\"]",
    "[role=\"banner\"]",
    "[role=\"contentinfo\"]",
    "[aria-hidden=\"true\"]",
];

/// Class/id substrings marking ads, popups, cookie notices and social widgets
pub const DEFAULT_DENIED_SUBSTRINGS: &[&str] = &[
    "advert",
    "ads-",
    "-ads",
    "ad-slot",
    "ad-banner",
    "adsbygoogle",
    "sponsor",
    "popup",
    "modal",
    "cookie",
    "gdpr",
    "consent",
    "social",
    "share",
    "sidebar",
    "newsletter",
    "related",
    "recommended",
    "comments",
    "menu",
];

/// Locator strategies, most specific first
pub const DEFAULT_LOCATOR_STRATEGIES: &[&[&str]] = &[
    // Semantic containers
    &["article", "main", "[role=\"main\"]"],
    // Content classes
    &[
        ".content",
        ".main-content",
        ".post-content",
        ".entry-content",
        ".article-content",
        ".story-content",
        ".text-content",
        ".post-body",
        ".article-body",
        ".story-body",
        ".entry",
        ".story",
    ],
    // Content ids
    &["#content", "#main-content", "#article", "#story"],
    &["body"],
];

/// Lines matching any of these (lowercased) are treated as interface chrome
pub const DEFAULT_SKIP_LINE_PATTERNS: &[&str] = &[
    r"^(home|about|contact|login|log in|register|sign in|sign up|menu|search|subscribe)$",
    r"^(privacy|terms|cookies|gdpr|accept|decline|close|×)$",
    r"^(skip to (main )?content|back to top|read more|load more|show more)$",
    r"^(this (web)?site uses cookies|we use cookies)\b.*$",
    r"^(©|\(c\)|copyright\b).{0,80}(all rights reserved)?\.?$",
    r"^(share( this)?( on)?|follow us( on)?)\b.{0,40}$",
    r"^[\d\s\-\.\(\)]+$",
    r"^[^\w]*$",
];

/// Minimum characters an element must hold to count toward a strategy
pub const DEFAULT_MIN_ELEMENT_LENGTH: usize = 100;

/// Minimum aggregate characters for a strategy to be accepted
pub const DEFAULT_MIN_STRATEGY_LENGTH: usize = 200;

/// Lines at or below this many characters are dropped
pub const DEFAULT_MIN_LINE_LENGTH: usize = 20;

/// Tables that drive the content sanitizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTables {
    /// CSS selectors whose matches are removed outright
    pub removed_selectors: Vec<String>,

    /// Case-insensitive substrings of `class`/`id` that remove an element
    pub denied_substrings: Vec<String>,

    /// Ordered groups of CSS selectors tried to locate the main text
    pub locator_strategies: Vec<Vec<String>>,

    /// Regular expressions for lines to drop after normalization
    pub skip_line_patterns: Vec<String>,

    pub min_element_length: usize,
    pub min_strategy_length: usize,
    pub min_line_length: usize,
}

impl Default for PatternTables {
    fn default() -> Self {
        Self {
            removed_selectors: to_owned(DEFAULT_REMOVED_SELECTORS),
            denied_substrings: to_owned(DEFAULT_DENIED_SUBSTRINGS),
            locator_strategies: DEFAULT_LOCATOR_STRATEGIES
                .iter()
                .map(|group| to_owned(group))
                .collect(),
            skip_line_patterns: to_owned(DEFAULT_SKIP_LINE_PATTERNS),
            min_element_length: DEFAULT_MIN_ELEMENT_LENGTH,
            min_strategy_length: DEFAULT_MIN_STRATEGY_LENGTH,
            min_line_length: DEFAULT_MIN_LINE_LENGTH,
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
