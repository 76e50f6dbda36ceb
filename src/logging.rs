use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the stdout subscriber for the process. Call once, before any
/// pipeline work; `RUST_LOG` overrides the default filter.
pub fn configure_logging() {
    let default_filter = "info,web_request=info,seen_store=info";

    let stdout_log = fmt::layer().with_writer(io::stdout).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
    );

    tracing_subscriber::Registry::default().with(stdout_log).init();
}
