//! Crawler module for single-page fetches and bounded crawls
//!
//! This module contains the orchestration layer, including:
//! - The per-invocation [`ScrapeContext`] holding transport and rendering resources
//! - The breadth-first [`Frontier`]
//! - The crawl loop and single-document fetch
//! - The configuration-driven [`Scraper`] entry point

mod context;
mod engine;
mod frontier;

pub use context::ScrapeContext;
pub use engine::{crawl, fetch_document, summarize, CrawlConfig, CrawlReport, CrawlSummary};
pub use frontier::{Frontier, QueuedUrl};

use crate::config::Config;
use crate::extract::ExtractedDocument;
use crate::SiftError;
use tokio_util::sync::CancellationToken;

/// Runs fetches and crawls from a loaded configuration
///
/// Every call builds its own [`ScrapeContext`], so concurrent calls on
/// separate scrapers share no state.
///
/// # Example
///
/// ```no_run
/// use pagesift::{Config, Scraper};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> pagesift::Result<()> {
/// let scraper = Scraper::new(Config::default());
/// let report = scraper.crawl("https://example.com/", &CancellationToken::new()).await?;
/// println!("Captured {} pages", report.summary.pages_captured);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Scraper {
    config: Config,
    config_hash: Option<String>,
    seed: Option<u64>,
}

impl Scraper {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_hash: None,
            seed: None,
        }
    }

    /// Attaches the configuration fingerprint reported with each crawl
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Makes identity selection, pacing and backoff reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches and extracts one page
    pub async fn fetch(&self, url: &str) -> Result<ExtractedDocument, SiftError> {
        let mut ctx = self.context()?;
        fetch_document(url, &self.config.fetch_config(), &mut ctx).await
    }

    /// Crawls the site of `start_url` within the configured budgets
    pub async fn crawl(
        &self,
        start_url: &str,
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, SiftError> {
        let mut ctx = self.context()?;
        let mut report = crawl(start_url, &self.config.crawl_config(), &mut ctx, cancel).await?;
        report.config_hash = self.config_hash.clone();
        Ok(report)
    }

    fn context(&self) -> Result<ScrapeContext, SiftError> {
        let ctx = ScrapeContext::from_config(&self.config)?;
        Ok(match self.seed {
            Some(seed) => ctx.with_seed(seed),
            None => ctx,
        })
    }
}
