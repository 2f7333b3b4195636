//! Pagesift main entry point
//!
//! This is the command-line interface for fetching single pages and running
//! bounded same-site crawls.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pagesift::config::{load_config_with_hash, validate, Config};
use pagesift::output::{self, OutputFormat};
use pagesift::Scraper;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Pagesift: resilient page retrieval and content extraction
///
/// Pagesift fetches pages through a rendering engine or plain HTTP, strips
/// navigation and advertising to recover the main text, and collects page
/// metadata. Reports go to stdout (or --output); logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(version)]
#[command(about = "Resilient page retrieval and content extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, default_value = "json", global = true)]
    format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "PATH", global = true)]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(flatten)]
    fetch: FetchOverrides,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and extract a single page
    Fetch {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Crawl pages on the same site as the start URL
    Crawl {
        #[arg(value_name = "URL")]
        url: String,

        #[command(flatten)]
        budgets: CrawlOverrides,
    },
}

/// Fetch settings that override the configuration file
#[derive(Args, Debug, Default)]
struct FetchOverrides {
    /// Try the rendering engine before plain HTTP
    #[arg(long, global = true)]
    render: bool,

    /// Send only the minimal header set
    #[arg(long, global = true)]
    no_stealth: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Plain HTTP attempts per URL
    #[arg(long, value_name = "N", global = true)]
    retries: Option<u32>,

    /// Minimum pacing delay between crawl requests, in seconds
    #[arg(long, value_name = "SECS", global = true)]
    delay_min: Option<f64>,

    /// Maximum pacing delay between crawl requests, in seconds
    #[arg(long, value_name = "SECS", global = true)]
    delay_max: Option<f64>,

    /// Rendering wait in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    render_wait: Option<u64>,

    /// WebDriver endpoint for the rendering engine
    #[arg(long, value_name = "URL", global = true)]
    webdriver_url: Option<String>,

    /// Seed for identity selection, pacing and backoff
    #[arg(long, global = true)]
    seed: Option<u64>,
}

/// Crawl budgets that override the configuration file
#[derive(Args, Debug, Default)]
struct CrawlOverrides {
    /// Maximum pages to capture
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Maximum link depth from the start URL
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Links followed from each page
    #[arg(long, value_name = "N")]
    links_per_page: Option<usize>,

    /// Minimum characters of text for a page to count
    #[arg(long, value_name = "N")]
    min_length: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_fetch_overrides(&mut config, &cli.fetch);
    if let Command::Crawl { budgets, .. } = &cli.command {
        apply_crawl_overrides(&mut config, budgets);
    }
    validate(&config).context("invalid settings")?;

    let mut scraper = Scraper::new(config);
    if let Some(hash) = config_hash {
        scraper = scraper.with_config_hash(hash);
    }
    if let Some(seed) = cli.fetch.seed {
        scraper = scraper.with_seed(seed);
    }

    let rendered = match &cli.command {
        Command::Fetch { url } => handle_fetch(&scraper, url, cli.format).await?,
        Command::Crawl { url, .. } => handle_crawl(&scraper, url, cli.format, cli.quiet).await?,
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagesift=info,warn"),
            1 => EnvFilter::new("pagesift=debug,info"),
            2 => EnvFilter::new("pagesift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn apply_fetch_overrides(config: &mut Config, overrides: &FetchOverrides) {
    let fetch = &mut config.fetch;
    if overrides.render {
        fetch.render = true;
    }
    if overrides.no_stealth {
        fetch.stealth = false;
    }
    if let Some(timeout) = overrides.timeout {
        fetch.timeout_secs = timeout;
    }
    if let Some(retries) = overrides.retries {
        fetch.retry_attempts = retries;
    }
    if let Some(min) = overrides.delay_min {
        fetch.delay_min_secs = min;
    }
    if let Some(max) = overrides.delay_max {
        fetch.delay_max_secs = max;
    }
    if let Some(wait) = overrides.render_wait {
        fetch.render_wait_ms = wait;
    }
    if let Some(url) = &overrides.webdriver_url {
        fetch.webdriver_url = url.clone();
    }
}

fn apply_crawl_overrides(config: &mut Config, overrides: &CrawlOverrides) {
    let crawl = &mut config.crawl;
    if let Some(max_pages) = overrides.max_pages {
        crawl.max_pages = max_pages;
    }
    if let Some(max_depth) = overrides.max_depth {
        crawl.max_depth = max_depth;
    }
    if let Some(links) = overrides.links_per_page {
        crawl.links_per_page = links;
    }
    if let Some(min_length) = overrides.min_length {
        crawl.min_document_length = min_length;
    }
}

/// Handles `pagesift fetch`: one page, rendered in the requested format
async fn handle_fetch(scraper: &Scraper, url: &str, format: OutputFormat) -> anyhow::Result<String> {
    let document = scraper
        .fetch(url)
        .await
        .with_context(|| format!("could not fetch {}", url))?;

    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&document)? + "\n",
        OutputFormat::Markdown => output::format_markdown_document(&document),
    })
}

/// Handles `pagesift crawl`: Ctrl-C stops at the next step and still reports
async fn handle_crawl(
    scraper: &Scraper,
    url: &str,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<String> {
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current step");
            signal_token.cancel();
        }
    });

    let report = match scraper.crawl(url, &cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if !quiet {
        output::print_summary(&report.summary);
    }

    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
        OutputFormat::Markdown => output::format_markdown_report(&report),
    })
}
