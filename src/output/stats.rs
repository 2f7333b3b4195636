//! Human-readable crawl statistics
//!
//! Printed to stderr so stdout stays free for the report itself.

use crate::crawler::CrawlSummary;
use std::io::Write;

/// Prints a crawl summary to stderr
pub fn print_summary(summary: &CrawlSummary) {
    let mut stderr = std::io::stderr().lock();
    // Nothing useful to do if stderr is gone
    let _ = write_summary(summary, &mut stderr);
}

/// Writes a crawl summary in the format used by [`print_summary`]
pub fn write_summary<W: Write>(summary: &CrawlSummary, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "=== Crawl Statistics ===\n")?;

    writeln!(out, "Overview:")?;
    writeln!(out, "  Start URL: {}", summary.start_url)?;
    writeln!(out, "  Pages captured: {}", summary.pages_captured)?;
    writeln!(out, "  URLs attempted: {}", summary.urls_attempted)?;
    writeln!(out, "  Characters captured: {}", summary.aggregate_text_length)?;
    writeln!(out, "  Max depth reached: {}", summary.max_depth_reached)?;
    writeln!(out, "  Duration: {:.1}s", summary.duration_ms as f64 / 1000.0)?;
    writeln!(out)?;

    if !summary.failed_urls.is_empty() {
        writeln!(out, "Failed URLs ({}):", summary.failed_count)?;
        for url in &summary.failed_urls {
            writeln!(out, "  - {}", url)?;
        }
        writeln!(out)?;
    }

    if summary.cancelled {
        writeln!(out, "Crawl was cancelled before completion.")?;
    }

    writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} URLs captured)",
        summary.success_rate * 100.0,
        summary.pages_captured,
        summary.urls_attempted
    )
}
