//! Analytics service: feed ingestion into the event ledger plus the query API.

use ledger_api::server::{self, AppState};
use ledger_ingest::IngestionAdapter;
use ledger_query::AggregationEngine;
use ledger_store::EventLedger;
use ledger_types::LedgerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LedgerConfig::from_env()?;
    let ledger = Arc::new(EventLedger::new(config.capacity)?);
    let (publisher, feed) = ledger_ingest::channel(config.feed_buffer);
    let ingest = IngestionAdapter::new(ledger.clone()).spawn(feed);
    let engine = Arc::new(AggregationEngine::new(ledger, config.windows));
    tracing::info!(
        capacity = config.capacity,
        short_window_secs = config.windows.short.num_seconds(),
        long_window_secs = config.windows.long.num_seconds(),
        "event ledger ready"
    );

    let state = Arc::new(AppState {
        engine,
        publisher,
        ingest: ingest.counters(),
    });
    let app = server::router(state);
    let addr: SocketAddr = std::env::var("ANALYTICS_LISTEN")
        .unwrap_or_else(|_| "0.0.0.0:4002".to_string())
        .parse()?;
    tracing::info!("analytics API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let stats = ingest.shutdown().await?;
    tracing::info!(accepted = stats.accepted, rejected = stats.rejected, "shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
