//! Types shared across the feed module.

use serde::Deserialize;
use thiserror::Error;
use tokio::time::Duration;

/// Upper bound on one feed request, connect to last byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One item from a parsed feed: a named, ordered field list. Insertion
/// order is the feed-supplied order; the fingerprinter canonicalizes it
/// before hashing, so order never affects identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    fields: Vec<(String, String)>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value recorded under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn title(&self) -> &str {
        self.get("title").unwrap_or("")
    }

    pub fn link(&self) -> Option<&str> {
        self.get("link")
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// JSON Feed document, reduced to the fields announcements need.
#[derive(Debug, Deserialize)]
pub struct JsonFeed {
    #[serde(default)]
    pub items: Vec<JsonFeedItem>,
}

#[derive(Debug, Deserialize)]
pub struct JsonFeedItem {
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub date_published: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid feed url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("response body is not valid UTF-8")]
    Encoding,
    #[error("content is not a recognized feed: {0}")]
    Parse(String),
}
