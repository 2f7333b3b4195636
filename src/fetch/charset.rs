//! Character set detection for HTML bodies
//!
//! The encoding is taken from, in order:
//! 1. A byte order mark
//! 2. The `charset` parameter of the Content-Type header
//! 3. A `<meta charset>` or `http-equiv` declaration near the top of the document
//! 4. Statistical detection over the whole body

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use regex::bytes::Regex;
use std::sync::OnceLock;

/// How far into the body a `<meta>` declaration is looked for
const META_SNIFF_BYTES: usize = 1024;

fn meta_charset_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).ok()
        })
        .as_ref()
}

/// Decodes an HTML body to text
///
/// Invalid sequences are replaced rather than rejected.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(bytes, content_type);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Body had malformed {} sequences", used.name());
    }
    text.into_owned()
}

/// Picks the encoding an HTML body should be decoded with
pub fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(encoding) = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    if let Some(encoding) = meta_charset(bytes) {
        return encoding;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// The `charset` parameter of a Content-Type value
fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

fn meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let window = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let label = meta_charset_pattern()?.captures(window)?.get(1)?;
    let encoding = Encoding::for_label(label.as_bytes())?;

    // ASCII-compatible bytes cannot be UTF-16; HTML treats the claim as UTF-8
    if encoding == UTF_16LE || encoding == UTF_16BE {
        Some(UTF_8)
    } else {
        Some(encoding)
    }
}
