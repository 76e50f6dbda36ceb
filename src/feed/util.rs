//! Helpers for feed fetching and parsing.

use chrono::{DateTime, Utc};
use std::io::Read;
use tracing::debug;

use crate::TARGET_WEB_REQUEST;

/// A feed URL must be absolute http(s) before any request is attempted.
pub fn is_valid_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Parse a timestamp in the formats feeds actually emit.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(date) = DateTime::parse_from_str(date_str, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    None
}

/// Repair almost-well-formed XML: strip the BOM and any leading garbage,
/// replace HTML entities XML parsers reject, drop characters outside the
/// XML character range, and ensure a declaration is present.
pub fn cleanup_xml(xml: &str) -> String {
    let mut cleaned = xml.trim_start_matches('\u{FEFF}').trim().to_string();

    for marker in ["<?xml", "<rss", "<feed"] {
        if let Some(start) = cleaned.find(marker) {
            cleaned = cleaned[start..].to_string();
            break;
        }
    }

    for (entity, replacement) in [
        ("&nbsp;", "&#160;"),
        ("&ndash;", "&#8211;"),
        ("&mdash;", "&#8212;"),
        ("&rsquo;", "&#8217;"),
        ("&lsquo;", "&#8216;"),
        ("&rdquo;", "&#8221;"),
        ("&ldquo;", "&#8220;"),
        ("&apos;", "&#39;"),
        ("&amp;amp;", "&amp;"),
    ] {
        cleaned = cleaned.replace(entity, replacement);
    }

    cleaned.retain(|c| {
        matches!(c,
            '\u{0009}' | '\u{000A}' | '\u{000D}'
            | '\u{0020}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}')
    });

    if !cleaned.starts_with("<?xml") {
        cleaned = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", cleaned);
    }

    cleaned
}

fn read_all<R: Read>(mut reader: R) -> Option<Vec<u8>> {
    let mut decoded = Vec::new();
    match reader.read_to_end(&mut decoded) {
        Ok(_) if !decoded.is_empty() => Some(decoded),
        _ => None,
    }
}

/// Feed servers routinely mislabel compressed bodies; try the common
/// encodings and fall back to the raw bytes when none apply.
pub fn decompress_body(bytes: &[u8], url: &str) -> Vec<u8> {
    if let Some(decoded) = read_all(flate2::read::GzDecoder::new(bytes)) {
        debug!(target: TARGET_WEB_REQUEST, "Decompressed gzip body from {}", url);
        return decoded;
    }

    if let Some(decoded) = read_all(flate2::read::ZlibDecoder::new(bytes)) {
        debug!(target: TARGET_WEB_REQUEST, "Decompressed zlib body from {}", url);
        return decoded;
    }

    if let Some(decoded) = read_all(flate2::read::DeflateDecoder::new(bytes)) {
        debug!(target: TARGET_WEB_REQUEST, "Decompressed deflate body from {}", url);
        return decoded;
    }

    bytes.to_vec()
}
