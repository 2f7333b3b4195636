//! Crawl engine - bounded breadth-first crawl orchestration
//!
//! This module contains the crawl loop, including:
//! - Seeding and draining the frontier
//! - Pacing requests with a randomized delay
//! - Running the fetch chain and building documents
//! - Expanding same-site links up to the depth budget
//! - Honoring cancellation between steps
//! - Aggregating the crawl summary

use crate::crawler::context::ScrapeContext;
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::extract::ExtractedDocument;
use crate::fetch::{fetch_page, random_duration, FetchConfig};
use crate::url::{normalize_url, LinkFilter};
use crate::SiftError;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Budgets for one crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    /// Stop after capturing this many documents
    pub max_pages: usize,

    /// Deepest link distance from the start URL that is fetched
    pub max_depth: u32,

    /// Links taken from each captured page for the next level
    pub links_per_page: usize,

    /// Pages with this many characters of text or fewer count as failures
    pub min_document_length: usize,

    pub fetch: FetchConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 2,
            links_per_page: 10,
            min_document_length: 50,
            fetch: FetchConfig::default(),
        }
    }
}

/// Aggregate outcome of one crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlSummary {
    pub start_url: String,
    pub pages_captured: usize,

    /// URLs for which a fetch was started
    pub urls_attempted: usize,

    pub failed_count: usize,

    /// `pages_captured / max(urls_attempted, 1)`
    pub success_rate: f64,

    /// Total characters of captured text
    pub aggregate_text_length: usize,

    pub max_depth_reached: u32,

    /// Failed URLs in the order they failed
    pub failed_urls: Vec<String>,

    /// True if the crawl stopped on a cancellation request
    pub cancelled: bool,

    pub duration_ms: u64,
}

/// Documents and summary produced by a crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub documents: Vec<ExtractedDocument>,
    pub summary: CrawlSummary,

    /// Fingerprint of the configuration file the crawl ran with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

/// Runs a bounded same-site crawl from `start_url`
///
/// # Crawl Flow
///
/// 1. Seed the frontier with `(start_url, 0)`
/// 2. While the frontier is non-empty, fewer than `max_pages` documents are
///    captured, and no cancellation was requested:
///    a. Pop the next URL; skip it if visited or deeper than `max_depth`
///    b. Mark it visited and wait a random delay from `delay_range`
///    c. Run the fetch chain
///    d. Keep the document if its text exceeds `min_document_length`,
///       then enqueue up to `links_per_page` of its links at `depth + 1`
///    e. Otherwise record the URL as failed
/// 3. Release the context's resources and summarize
///
/// Per-page failures never abort the crawl. The context is shut down on
/// every exit path.
///
/// # Errors
///
/// Only an unusable start URL is an error.
pub async fn crawl(
    start_url: &str,
    config: &CrawlConfig,
    ctx: &mut ScrapeContext,
    cancel: &CancellationToken,
) -> Result<CrawlReport, SiftError> {
    let start = match normalize_url(start_url) {
        Ok(start) => start,
        Err(e) => {
            ctx.shutdown().await;
            return Err(e.into());
        }
    };

    let report = run(start, config, ctx, cancel).await;
    ctx.shutdown().await;
    Ok(report)
}

async fn run(
    start: Url,
    config: &CrawlConfig,
    ctx: &mut ScrapeContext,
    cancel: &CancellationToken,
) -> CrawlReport {
    let started = Instant::now();
    let link_filter = LinkFilter::new(&start);
    let mut frontier = Frontier::new(start.clone());
    let mut documents: Vec<ExtractedDocument> = Vec::new();
    let mut attempted = 0usize;
    let mut cancelled = false;

    tracing::info!(
        "Starting crawl of {} ({} pages, depth {})",
        start,
        config.max_pages,
        config.max_depth
    );

    while documents.len() < config.max_pages {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let Some(QueuedUrl { url, depth }) = frontier.pop() else {
            tracing::info!("Frontier is empty, crawl complete");
            break;
        };

        if frontier.is_visited(url.as_str()) || depth > config.max_depth {
            continue;
        }
        frontier.mark_visited(url.as_str());

        if !pace(config, ctx, cancel, &url).await {
            cancelled = true;
            break;
        }
        attempted += 1;

        match fetch_page(url.as_str(), &config.fetch, ctx).await {
            Ok(page) if page.text_length() > config.min_document_length => {
                if let Ok(final_url) = normalize_url(&page.result.final_url) {
                    frontier.mark_visited(final_url.as_str());
                }

                let document = ExtractedDocument::from_page(page, depth, &link_filter);

                if depth < config.max_depth {
                    let mut enqueued = 0;
                    for link in document.links.iter().take(config.links_per_page) {
                        if let Ok(next) = Url::parse(link) {
                            if frontier.push(next, depth + 1) {
                                enqueued += 1;
                            }
                        }
                    }
                    tracing::debug!("Enqueued {} links from {}", enqueued, url);
                }

                tracing::info!(
                    "Captured {}/{}: {} ({} chars)",
                    documents.len() + 1,
                    config.max_pages,
                    url,
                    document.text_length()
                );
                documents.push(document);
            }
            Ok(page) => {
                let error = SiftError::InsufficientContent {
                    url: url.to_string(),
                    length: page.text_length(),
                };
                tracing::warn!("{}", error);
                frontier.mark_failed(url.as_str());
            }
            Err(e) => {
                tracing::warn!("Failed to capture {}: {}", url, e);
                frontier.mark_failed(url.as_str());
            }
        }

        if attempted % 10 == 0 {
            tracing::info!(
                "Progress: {} attempted, {} captured, {} in frontier",
                attempted,
                documents.len(),
                frontier.len()
            );
        }
    }

    if cancelled {
        tracing::info!("Crawl cancelled after {} attempts", attempted);
    }

    let summary = summarize(
        start.as_str(),
        &documents,
        attempted,
        frontier.into_failed(),
        cancelled,
        started.elapsed(),
    );

    tracing::info!(
        "Crawl completed: {} pages, {:.1}% success rate",
        summary.pages_captured,
        summary.success_rate * 100.0
    );

    CrawlReport {
        documents,
        summary,
        config_hash: None,
    }
}

/// Waits the pacing delay before a fetch
///
/// Returns `false` if cancellation was requested during the wait.
async fn pace(
    config: &CrawlConfig,
    ctx: &mut ScrapeContext,
    cancel: &CancellationToken,
    url: &Url,
) -> bool {
    let delay = random_duration(&mut ctx.rng, config.fetch.delay_range);
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }

    tracing::debug!("Waiting {:.1}s before {}", delay.as_secs_f64(), url);
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}

/// Builds the summary for a finished crawl
pub fn summarize(
    start_url: &str,
    documents: &[ExtractedDocument],
    attempted: usize,
    failed_urls: Vec<String>,
    cancelled: bool,
    elapsed: Duration,
) -> CrawlSummary {
    let pages_captured = documents.len();

    CrawlSummary {
        start_url: start_url.to_string(),
        pages_captured,
        urls_attempted: attempted,
        failed_count: failed_urls.len(),
        success_rate: pages_captured as f64 / attempted.max(1) as f64,
        aggregate_text_length: documents.iter().map(ExtractedDocument::text_length).sum(),
        max_depth_reached: documents.iter().map(|d| d.depth).max().unwrap_or(0),
        failed_urls,
        cancelled,
        duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Fetches and extracts a single page
///
/// Links on the page are filtered against the site the request ended up
/// on after redirects. The context is shut down before returning.
///
/// # Errors
///
/// * `SiftError::UrlError` - The URL is not a usable HTTP(S) URL
/// * `SiftError::Fetch` - Every fetch strategy failed
/// * `SiftError::InsufficientContent` - The page yielded no text
pub async fn fetch_document(
    url: &str,
    config: &FetchConfig,
    ctx: &mut ScrapeContext,
) -> Result<ExtractedDocument, SiftError> {
    let outcome = fetch_single(url, config, ctx).await;
    ctx.shutdown().await;
    outcome
}

async fn fetch_single(
    url: &str,
    config: &FetchConfig,
    ctx: &mut ScrapeContext,
) -> Result<ExtractedDocument, SiftError> {
    let target = normalize_url(url)?;
    let page = fetch_page(target.as_str(), config, ctx).await?;

    let length = page.text_length();
    if length == 0 {
        return Err(SiftError::InsufficientContent {
            url: target.to_string(),
            length,
        });
    }

    let site = Url::parse(&page.result.final_url).unwrap_or(target);
    tracing::info!("Fetched {} ({} chars)", site, length);
    Ok(ExtractedDocument::from_page(page, 0, &LinkFilter::new(&site)))
}
