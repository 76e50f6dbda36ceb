//! Feed configuration: the (name, url) list the run operates on.

use std::path::Path;

use encoding_rs::Encoding;
use thiserror::Error;

use crate::csv;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read feed config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown feed config encoding {0:?}")]
    UnknownEncoding(String),
    #[error("feed config {path} is not valid {encoding}")]
    Decode { path: String, encoding: String },
    #[error("feed config {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: csv::CsvError,
    },
    #[error("feed config {path}: record {record} needs a name and a url")]
    IncompleteRecord { path: String, record: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

/// Load the feed list: one `name,url` record per line, decoded with any
/// WHATWG encoding label (`utf-8`, `shift_jis`, `windows-1252`, ...).
/// Blank lines are skipped and extra columns ignored.
pub fn load_feeds(path: &Path, encoding_label: &str) -> Result<Vec<FeedConfig>, ConfigError> {
    let display = path.display().to_string();

    let encoding = Encoding::for_label(encoding_label.as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(encoding_label.to_string()))?;

    let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;

    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(ConfigError::Decode {
            path: display,
            encoding: encoding.name().to_string(),
        });
    }

    let records = csv::parse_records(&text).map_err(|source| ConfigError::Malformed {
        path: display.clone(),
        source,
    })?;

    let mut feeds = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() < 2 || record[0].trim().is_empty() || record[1].trim().is_empty() {
            return Err(ConfigError::IncompleteRecord {
                path: display.clone(),
                record: index + 1,
            });
        }
        feeds.push(FeedConfig {
            name: record[0].trim().to_string(),
            url: record[1].trim().to_string(),
        });
    }

    Ok(feeds)
}
