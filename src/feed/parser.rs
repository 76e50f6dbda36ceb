//! Feed parsing for RSS, Atom, and JSON Feed documents.

use feed_rs::parser;
use tracing::debug;

use super::types::{Entry, FetchError, JsonFeed, JsonFeedItem};
use super::util::{cleanup_xml, parse_date};
use crate::TARGET_WEB_REQUEST;

/// Parse a fetched document into entries. JSON Feeds are recognized by
/// content type; everything else goes through the XML parser, with one
/// cleanup-and-reparse attempt for almost-well-formed documents.
pub fn parse_feed(text: &str, content_type: Option<&str>) -> Result<Vec<Entry>, FetchError> {
    if let Some(ct) = content_type {
        if ct.contains("json") {
            return parse_json_feed(text);
        }
    }

    match parser::parse(text.as_bytes()) {
        Ok(feed) => Ok(collect_entries(feed)),
        Err(first_err) => {
            let cleaned = cleanup_xml(text);
            if cleaned.contains("<rss") || cleaned.contains("<feed") {
                match parser::parse(cleaned.as_bytes()) {
                    Ok(feed) => {
                        debug!(target: TARGET_WEB_REQUEST, "Feed parsed after XML cleanup");
                        Ok(collect_entries(feed))
                    }
                    Err(second_err) => Err(FetchError::Parse(format!(
                        "feed did not parse even after cleanup: {}; {}",
                        first_err, second_err
                    ))),
                }
            } else {
                Err(FetchError::Parse(format!(
                    "not an RSS or Atom document: {}",
                    first_err
                )))
            }
        }
    }
}

fn collect_entries(feed: feed_rs::model::Feed) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(feed.entries.len());

    for entry in feed.entries {
        let mut out = Entry::new();
        if let Some(title) = entry.title {
            out.push_field("title", title.content);
        }
        if let Some(link) = entry.links.first() {
            out.push_field("link", link.href.clone());
        }
        if !entry.id.is_empty() {
            out.push_field("id", entry.id);
        }
        if let Some(published) = entry.published {
            out.push_field("published", published.to_rfc3339());
        }
        if let Some(updated) = entry.updated {
            out.push_field("updated", updated.to_rfc3339());
        }
        if let Some(summary) = entry.summary {
            out.push_field("summary", summary.content);
        }
        if let Some(author) = entry.authors.first() {
            if !author.name.is_empty() {
                out.push_field("author", author.name.clone());
            }
        }
        entries.push(out);
    }

    entries
}

fn parse_json_feed(text: &str) -> Result<Vec<Entry>, FetchError> {
    let feed: JsonFeed = serde_json::from_str(text)
        .map_err(|err| FetchError::Parse(format!("invalid JSON feed: {}", err)))?;

    let mut entries = Vec::with_capacity(feed.items.len());
    for item in feed.items {
        let JsonFeedItem {
            id,
            url,
            title,
            date_published,
        } = item;

        let mut out = Entry::new();
        if let Some(title) = title {
            out.push_field("title", title);
        }
        match (url, &id) {
            (Some(url), _) => out.push_field("link", url),
            (None, Some(id)) => out.push_field("link", id.clone()),
            (None, None) => {}
        }
        if let Some(id) = id {
            out.push_field("id", id);
        }
        if let Some(date) = date_published {
            let normalized = parse_date(&date)
                .map(|parsed| parsed.to_rfc3339())
                .unwrap_or(date);
            out.push_field("published", normalized);
        }
        entries.push(out);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_FIXTURE: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
<channel>
<title>Tech</title>
<link>http://example.com/</link>
<description>news</description>
<item>
<title>A</title>
<link>http://x/1</link>
<guid>http://x/1</guid>
<pubDate>Tue, 01 Jul 2025 10:00:00 GMT</pubDate>
<description>first entry</description>
</item>
</channel>
</rss>"#;

    const ATOM_FIXTURE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<title>Example</title>
<id>urn:feed</id>
<updated>2025-07-01T10:00:00Z</updated>
<entry>
<title>B</title>
<id>urn:entry-b</id>
<link href="http://x/2"/>
<updated>2025-07-01T10:00:00Z</updated>
</entry>
</feed>"#;

    #[test]
    fn parses_rss_entries_with_their_fields() {
        let entries = parse_feed(RSS_FIXTURE, Some("application/rss+xml")).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.title(), "A");
        assert_eq!(entry.link(), Some("http://x/1"));
        assert_eq!(entry.get("id"), Some("http://x/1"));
        assert_eq!(entry.get("summary"), Some("first entry"));
        assert!(entry.get("published").unwrap().starts_with("2025-07-01T10:00:00"));
    }

    #[test]
    fn parses_atom_entries() {
        let entries = parse_feed(ATOM_FIXTURE, None).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.title(), "B");
        assert_eq!(entry.link(), Some("http://x/2"));
        assert_eq!(entry.get("id"), Some("urn:entry-b"));
        assert!(entry.get("updated").unwrap().starts_with("2025-07-01T10:00:00"));
    }

    #[test]
    fn parses_json_feed_by_content_type() {
        let body = r#"{"version":"https://jsonfeed.org/version/1","title":"T",
            "items":[{"id":"1","url":"http://x/3","title":"C",
                      "date_published":"2025-07-01T10:00:00Z"}]}"#;
        let entries = parse_feed(body, Some("application/feed+json")).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.title(), "C");
        assert_eq!(entry.link(), Some("http://x/3"));
        assert_eq!(entry.get("id"), Some("1"));
        assert!(entry.get("published").unwrap().starts_with("2025-07-01"));
    }

    #[test]
    fn json_feed_falls_back_to_id_for_link() {
        let body = r#"{"items":[{"id":"http://x/4","title":"D"}]}"#;
        let entries = parse_feed(body, Some("application/json")).unwrap();
        assert_eq!(entries[0].link(), Some("http://x/4"));
    }

    #[test]
    fn reparses_after_xml_cleanup() {
        let noisy = format!("leading junk{}", RSS_FIXTURE);
        let entries = parse_feed(&noisy, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title(), "A");
    }

    #[test]
    fn rejects_documents_that_are_not_feeds() {
        let err = parse_feed("plain text, no feed here", None).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
