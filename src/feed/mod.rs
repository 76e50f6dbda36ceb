//! Feed fetching and parsing.
//!
//! `FeedSource` is the seam between the pipeline and the network: the
//! production implementation fetches over HTTP and parses RSS, Atom, and
//! JSON Feed documents; tests substitute fixture-backed sources.

mod client;
mod parser;
mod types;
mod util;

pub use self::client::HttpFeedSource;
pub use self::parser::parse_feed;
pub use self::types::{Entry, FetchError};
pub use self::util::{cleanup_xml, decompress_body, is_valid_url, parse_date};

use async_trait::async_trait;

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse one feed URL into its entries.
    async fn fetch(&self, url: &str) -> Result<Vec<Entry>, FetchError>;
}
