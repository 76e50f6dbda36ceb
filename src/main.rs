use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use feedrelay::config;
use feedrelay::feed::HttpFeedSource;
use feedrelay::logging;
use feedrelay::notify::WebhookNotifier;
use feedrelay::pipeline;
use feedrelay::store::SeenStore;

/// Announce new feed entries to an incoming-webhook endpoint.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Incoming-webhook URL to post announcements to
    #[arg(long)]
    url: String,

    /// Display name attached to each post
    #[arg(long, default_value = "Bot")]
    username: String,

    /// Path of the seen-entry store
    #[arg(long, default_value = "entries.csv")]
    store: PathBuf,

    /// Path of the feed list, one name,url per line
    #[arg(long, default_value = "feeds.csv")]
    feeds: PathBuf,

    /// Text encoding of the feed list
    #[arg(long, default_value = "utf-8")]
    feed_encoding: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_logging();
    let cli = Cli::parse();

    let feeds = config::load_feeds(&cli.feeds, &cli.feed_encoding)
        .context("failed to load feed configuration")?;
    info!("Loaded {} feeds from {}", feeds.len(), cli.feeds.display());

    let mut store = SeenStore::load(&cli.store).context("failed to load seen-entry store")?;
    info!(
        "Seen-entry store {} has {} records",
        cli.store.display(),
        store.len()
    );

    let source = HttpFeedSource::new().context("failed to build HTTP client")?;
    let notifier = WebhookNotifier::new(cli.url, cli.username);

    let summary = pipeline::process_feeds(&feeds, &source, &mut store, &notifier).await;
    info!(
        "Run complete: {} feeds processed, {} failed, {} entries announced",
        summary.feeds_processed, summary.feeds_failed, summary.entries_announced
    );

    Ok(())
}
