//! Markdown report generation
//!
//! This module renders crawl reports and single documents as readable
//! markdown: a run summary, a table of captured pages, the failed URLs,
//! and one section per document with its metadata and text.

use crate::crawler::{CrawlReport, CrawlSummary};
use crate::extract::ExtractedDocument;

/// Documents longer than this are cut in the per-document sections
const MAX_TEXT_CHARS: usize = 5_000;

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    md.push_str("# Pagesift Crawl Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", summary.start_url));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration_ms as f64 / 1000.0
    ));
    md.push_str(&format!(
        "- **Status**: {}\n",
        if summary.cancelled { "cancelled" } else { "completed" }
    ));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    push_statistics(&mut md, summary);

    if !report.documents.is_empty() {
        md.push_str("## Captured Pages\n\n");
        md.push_str("| # | URL | Depth | Characters | Rendered |\n");
        md.push_str("|---|-----|-------|------------|----------|\n");
        for (i, doc) in report.documents.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                i + 1,
                doc.final_url,
                doc.depth,
                doc.text_length(),
                if doc.rendered { "yes" } else { "no" }
            ));
        }
        md.push('\n');
    }

    if !summary.failed_urls.is_empty() {
        md.push_str("## Failed URLs\n\n");
        for url in &summary.failed_urls {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    for doc in &report.documents {
        md.push_str(&format_document_section(doc, "##"));
    }

    md
}

fn push_statistics(md: &mut String, summary: &CrawlSummary) {
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages Captured | {} |\n", summary.pages_captured));
    md.push_str(&format!("| URLs Attempted | {} |\n", summary.urls_attempted));
    md.push_str(&format!("| Failed | {} |\n", summary.failed_count));
    md.push_str(&format!(
        "| Success Rate | {:.2}% |\n",
        summary.success_rate * 100.0
    ));
    md.push_str(&format!(
        "| Total Characters | {} |\n",
        summary.aggregate_text_length
    ));
    md.push_str(&format!(
        "| Max Depth Reached | {} |\n\n",
        summary.max_depth_reached
    ));
}

/// Formats a single document as markdown
pub fn format_markdown_document(doc: &ExtractedDocument) -> String {
    format_document_section(doc, "#")
}

fn format_document_section(doc: &ExtractedDocument, heading: &str) -> String {
    let mut md = String::new();
    let title = doc.title.as_deref().unwrap_or(&doc.final_url);

    md.push_str(&format!("{} {}\n\n", heading, title));
    md.push_str(&format!("- **URL**: {}\n", doc.final_url));
    if doc.final_url != doc.url {
        md.push_str(&format!("- **Requested**: {}\n", doc.url));
    }
    md.push_str(&format!("- **Status**: {}\n", doc.status_code));
    md.push_str(&format!("- **Fetched**: {}\n", doc.fetched_at.to_rfc3339()));
    if let Some(description) = &doc.metadata.description {
        md.push_str(&format!("- **Description**: {}\n", description));
    }
    if let Some(author) = &doc.metadata.author {
        md.push_str(&format!("- **Author**: {}\n", author));
    }
    if let Some(language) = &doc.metadata.language {
        md.push_str(&format!("- **Language**: {}\n", language));
    }
    md.push_str(&format!(
        "- **Links**: {} | **Images**: {} | **Structured data blocks**: {}\n\n",
        doc.links.len(),
        doc.images.len(),
        doc.metadata.structured_data.len()
    ));

    let length = doc.text_length();
    if length > MAX_TEXT_CHARS {
        let cut: String = doc.text.chars().take(MAX_TEXT_CHARS).collect();
        md.push_str(&cut);
        md.push_str(&format!(
            "\n\n*... {} more characters*\n\n",
            length - MAX_TEXT_CHARS
        ));
    } else {
        md.push_str(&doc.text);
        md.push_str("\n\n");
    }

    md
}
