//! Output module for crawl reports and documents
//!
//! This module handles:
//! - Rendering reports and documents as markdown
//! - Writing reports and documents as JSON
//! - Printing crawl statistics

pub mod json;
mod markdown;
pub mod stats;

pub use json::{write_json, write_json_file};
pub use markdown::{format_markdown_document, format_markdown_report};
pub use stats::{print_summary, write_summary};

use std::str::FromStr;

/// Report encodings offered by the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown format '{}', expected json or markdown", other)),
        }
    }
}
