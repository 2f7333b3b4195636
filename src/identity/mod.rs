//! Stealth identity management
//!
//! Each fetch presents itself with a fresh identity: a user agent drawn from
//! a pool of real desktop browser signatures plus the header set that browser
//! would send for a top-level navigation. Selection goes through an injected
//! random source so tests can seed it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use url::Url;

/// Built-in pool of desktop browser signatures
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:122.0) Gecko/20100101 Firefox/122.0",
    // Safari on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Headers every identity carries, in the order a browser sends them
pub const BASELINE_HEADERS: &[&str] = &[
    "Accept",
    "Accept-Language",
    "Accept-Encoding",
    "Connection",
    "Cache-Control",
    "Upgrade-Insecure-Requests",
    "Sec-Fetch-Dest",
    "Sec-Fetch-Mode",
    "Sec-Fetch-Site",
    "Sec-Fetch-User",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

/// A user agent plus the ordered header set sent with one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// The selected browser signature
    pub user_agent: String,

    /// Header name/value pairs in send order, `User-Agent` included
    pub headers: Vec<(String, String)>,
}

impl Identity {
    /// Looks up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Produces per-request identities from a user-agent pool
#[derive(Debug, Clone)]
pub struct IdentityManager {
    user_agents: Vec<String>,
    accept_language: String,
}

impl Default for IdentityManager {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl IdentityManager {
    /// Creates a manager over the given pool
    ///
    /// An empty pool selects the built-in [`DEFAULT_USER_AGENTS`].
    pub fn new(user_agents: Vec<String>) -> Self {
        let user_agents = if user_agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect()
        } else {
            user_agents
        };

        Self {
            user_agents,
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }

    /// Overrides the Accept-Language value
    pub fn with_accept_language(mut self, accept_language: &str) -> Self {
        self.accept_language = accept_language.to_string();
        self
    }

    /// The user agents this manager selects from
    pub fn pool(&self) -> &[String] {
        &self.user_agents
    }

    /// Picks a user agent from the pool
    pub fn pick_user_agent<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.user_agents
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }

    /// Builds a fresh identity for a request to `target_url`
    ///
    /// The baseline headers are always present. With `stealth` the identity
    /// also carries `DNT` and, for Chromium signatures, the `sec-ch-ua`
    /// client hints. A `Referer` pointing at the target's origin is added
    /// when the URL has one.
    pub fn identity_for<R: Rng + ?Sized>(
        &self,
        target_url: &str,
        stealth: bool,
        rng: &mut R,
    ) -> Identity {
        let user_agent = self.pick_user_agent(rng);

        let mut headers = vec![
            ("User-Agent".to_string(), user_agent.clone()),
            ("Accept".to_string(), ACCEPT.to_string()),
            ("Accept-Language".to_string(), self.accept_language.clone()),
            ("Accept-Encoding".to_string(), "gzip, deflate, br".to_string()),
            ("Connection".to_string(), "keep-alive".to_string()),
            ("Cache-Control".to_string(), "max-age=0".to_string()),
            ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
            ("Sec-Fetch-Dest".to_string(), "document".to_string()),
            ("Sec-Fetch-Mode".to_string(), "navigate".to_string()),
            ("Sec-Fetch-Site".to_string(), "none".to_string()),
            ("Sec-Fetch-User".to_string(), "?1".to_string()),
        ];

        if stealth {
            headers.push(("DNT".to_string(), "1".to_string()));
            headers.extend(client_hints(&user_agent));
        }

        if let Some(origin) = origin_of(target_url) {
            headers.push(("Referer".to_string(), origin));
        }

        tracing::trace!("Identity for {}: {}", target_url, user_agent);

        Identity {
            user_agent,
            headers,
        }
    }
}

/// Returns `scheme://host[:port]/` for URLs with a tuple origin
pub fn origin_of(target_url: &str) -> Option<String> {
    let url = Url::parse(target_url).ok()?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/", origin.ascii_serialization()))
}

/// Chromium client hints matching a user agent, empty for other engines
fn client_hints(user_agent: &str) -> Vec<(String, String)> {
    let Some(major) = chrome_major_version(user_agent) else {
        return Vec::new();
    };

    let brand = if user_agent.contains("Edg/") {
        "Microsoft Edge"
    } else {
        "Google Chrome"
    };

    let platform = if user_agent.contains("Windows") {
        "Windows"
    } else if user_agent.contains("Macintosh") {
        "macOS"
    } else {
        "Linux"
    };

    vec![
        (
            "sec-ch-ua".to_string(),
            format!(
                "\"Not A(Brand\";v=\"99\", \"{}\";v=\"{}\", \"Chromium\";v=\"{}\"",
                brand, major, major
            ),
        ),
        ("sec-ch-ua-mobile".to_string(), "?0".to_string()),
        ("sec-ch-ua-platform".to_string(), format!("\"{}\"", platform)),
    ]
}

/// Extracts the Chrome major version from a user agent
fn chrome_major_version(user_agent: &str) -> Option<u32> {
    let rest = user_agent.split("Chrome/").nth(1)?;
    rest.split('.').next()?.parse().ok()
}
