//! The per-invocation pipeline: fetch, fingerprint, filter, announce,
//! record. One feed at a time, with per-feed failure isolation.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::config::FeedConfig;
use crate::feed::{Entry, FeedSource};
use crate::fingerprint::fingerprint;
use crate::notify::Notifier;
use crate::store::SeenStore;
use crate::{TARGET_STORE, TARGET_WEB_REQUEST};

/// Counters for one complete run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub feeds_processed: usize,
    pub feeds_failed: usize,
    pub entries_announced: usize,
}

fn format_message(feed_name: &str, entry: &Entry) -> String {
    format!(
        "{}: [{}]({})",
        feed_name,
        entry.title(),
        entry.link().unwrap_or("")
    )
}

/// Process every configured feed in order. A failure in one feed is
/// logged and never stops the remaining feeds.
pub async fn process_feeds(
    feeds: &[FeedConfig],
    source: &dyn FeedSource,
    store: &mut SeenStore,
    notifier: &dyn Notifier,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for feed in feeds {
        match process_feed(feed, source, store, notifier).await {
            Ok(announced) => {
                summary.feeds_processed += 1;
                summary.entries_announced += announced;
                if announced > 0 {
                    info!("{} new entries announced from {}", announced, feed.name);
                }
            }
            Err(err) => {
                summary.feeds_failed += 1;
                error!("Skipping feed {} ({}): {:#}", feed.name, feed.url, err);
            }
        }
    }

    summary
}

/// One feed's pass through the pipeline. Messages go out before their
/// fingerprints are persisted: a crash between the two steps means those
/// entries are announced again on the next run (at-least-once delivery,
/// never silent loss).
async fn process_feed(
    feed: &FeedConfig,
    source: &dyn FeedSource,
    store: &mut SeenStore,
    notifier: &dyn Notifier,
) -> Result<usize> {
    debug!(target: TARGET_WEB_REQUEST, "Fetching {} from {}", feed.name, feed.url);
    let entries = source.fetch(&feed.url).await?;
    debug!(target: TARGET_WEB_REQUEST, "Feed {} returned {} entries", feed.name, entries.len());

    let mut batch = Vec::with_capacity(entries.len());
    for entry in entries {
        match fingerprint(&entry) {
            Ok(digest) => batch.push((entry, digest)),
            Err(err) => warn!("Skipping malformed entry in {}: {}", feed.name, err),
        }
    }

    let new_entries = store.filter_new(batch);
    debug!("{} new entries found in {}", new_entries.len(), feed.name);
    if new_entries.is_empty() {
        return Ok(0);
    }

    let messages: Vec<String> = new_entries
        .iter()
        .map(|(entry, _)| format_message(&feed.name, entry))
        .collect();
    let delivered = notifier.send(&messages).await?;

    let recorded = store.append(&new_entries)?;
    debug!(target: TARGET_STORE, "Recorded {} fingerprints for {}", recorded, feed.name);

    Ok(delivered)
}
