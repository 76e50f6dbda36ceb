//! HTTP fetching of feed documents.

use async_trait::async_trait;
use reqwest::header;
use std::io::Read;
use tokio::time::timeout;
use tracing::debug;

use super::parser::parse_feed;
use super::types::{Entry, FetchError, REQUEST_TIMEOUT};
use super::util::{decompress_body, is_valid_url};
use super::FeedSource;
use crate::TARGET_WEB_REQUEST;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "application/feed+json, application/json, application/rss+xml, application/atom+xml, application/xml, text/xml, */*;q=0.9";

/// Production `FeedSource`: one GET per feed URL, bounded by
/// `REQUEST_TIMEOUT`, with fallback decompression for servers that
/// mislabel their response encoding.
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .redirect(reqwest::redirect::Policy::default())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Entry>, FetchError> {
        if !is_valid_url(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        debug!(target: TARGET_WEB_REQUEST, "Loading feed from {}", url);
        let response = timeout(
            REQUEST_TIMEOUT,
            self.client
                .get(url)
                .header(header::USER_AGENT, USER_AGENT)
                .header(header::ACCEPT, ACCEPT)
                .header(header::ACCEPT_ENCODING, "gzip, deflate, br")
                .send(),
        )
        .await
        .map_err(|_| FetchError::Timeout(REQUEST_TIMEOUT.as_secs()))??;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_lowercase());
        let content_encoding = response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_lowercase());

        let bytes = response.bytes().await?;

        let body = if content_encoding.as_deref() == Some("br") {
            let mut decoded = Vec::new();
            let mut reader = brotli::Decompressor::new(&bytes[..], 4096);
            if reader.read_to_end(&mut decoded).is_ok() && !decoded.is_empty() {
                decoded
            } else {
                decompress_body(&bytes, url)
            }
        } else {
            decompress_body(&bytes, url)
        };

        let text = String::from_utf8(body).map_err(|_| FetchError::Encoding)?;
        debug!(
            target: TARGET_WEB_REQUEST,
            "Fetched {} bytes from {} ({:?})",
            text.len(),
            url,
            content_type
        );

        parse_feed(&text, content_type.as_deref())
    }
}
