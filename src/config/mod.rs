//! Configuration module for Pagesift
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning them into the runtime settings used by the fetch chain,
//! the sanitizer, and the crawl engine.
//!
//! # Example
//!
//! ```no_run
//! use pagesift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagesift.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlSection, FetchSection, IdentitySection, PatternSection};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash, parse_config};

// Re-export validation for callers that modify a loaded config
pub use validation::validate;

use crate::crawler::CrawlConfig;
use crate::extract::PatternTables;
use crate::fetch::{FetchConfig, RetryPolicy};
use crate::identity::IdentityManager;
use std::time::Duration;

impl Config {
    /// Builds the per-invocation fetch settings
    pub fn fetch_config(&self) -> FetchConfig {
        let fetch = &self.fetch;
        FetchConfig {
            render_capable: fetch.render,
            stealth: fetch.stealth,
            timeout: Duration::from_secs(fetch.timeout_secs),
            retry_attempts: fetch.retry_attempts,
            delay_range: (fetch.delay_min_secs, fetch.delay_max_secs),
            render_wait: Duration::from_millis(fetch.render_wait_ms),
            max_body_bytes: fetch.max_body_bytes,
            retry: RetryPolicy {
                rate_limit_backoff: (fetch.rate_limit_backoff[0], fetch.rate_limit_backoff[1]),
                transient_backoff: (fetch.transient_backoff[0], fetch.transient_backoff[1]),
            },
        }
    }

    /// Builds the crawl budgets, embedding the fetch settings
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_pages: self.crawl.max_pages,
            max_depth: self.crawl.max_depth,
            links_per_page: self.crawl.links_per_page,
            min_document_length: self.crawl.min_document_length,
            fetch: self.fetch_config(),
        }
    }

    /// Built-in sanitizer tables with this configuration's overrides applied
    pub fn pattern_tables(&self) -> PatternTables {
        let mut tables = PatternTables::default();
        let overrides = &self.patterns;

        if let Some(selectors) = &overrides.removed_selectors {
            tables.removed_selectors = selectors.clone();
        }
        if let Some(substrings) = &overrides.denied_substrings {
            tables.denied_substrings = substrings.clone();
        }
        if let Some(strategies) = &overrides.locator_strategies {
            tables.locator_strategies = strategies.clone();
        }
        if let Some(patterns) = &overrides.skip_line_patterns {
            tables.skip_line_patterns = patterns.clone();
        }

        tables
    }

    /// Identity manager for the configured user-agent pool
    pub fn identity_manager(&self) -> IdentityManager {
        IdentityManager::new(self.identity.user_agents.clone())
            .with_accept_language(&self.identity.accept_language)
    }
}
