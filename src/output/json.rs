//! JSON output
//!
//! Crawl reports and documents serialize with `serde_json` as-is; these
//! helpers only pick the writer.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `value` as pretty-printed JSON followed by a newline
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    writer.flush().map_err(serde_json::Error::io)
}

/// Writes `value` as JSON to a file, replacing any existing content
pub fn write_json_file<T: Serialize>(value: &T, path: &Path) -> Result<(), crate::SiftError> {
    let file = File::create(path)?;
    write_json(value, BufWriter::new(file))?;
    Ok(())
}
