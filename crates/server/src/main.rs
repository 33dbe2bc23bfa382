//! fedicomments server entry point.
//!
//! Loads configuration, restores the root cache, and serves the comments
//! endpoint over HTTP until interrupted. Logs go to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use fedicomments_client::{MastodonClient, MastodonConfig};
use fedicomments_core::{Aggregator, AppConfig, RootCache};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let client = MastodonClient::new(MastodonConfig::from(&config))?;
    let roots = Arc::new(RootCache::load(&config.cache_path));
    let aggregator = Aggregator::new(roots, Arc::new(client), config.owner_filter().map(str::to_string));
    let cache = Arc::clone(aggregator.cache());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, cached_queries = cache.len(), "Starting fedicomments server");

    axum::serve(listener, handler::build_router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, flushing root cache");
    if let Err(e) = tokio::task::spawn_blocking(move || cache.persist()).await? {
        tracing::warn!(error = %e, "final root cache flush failed");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
