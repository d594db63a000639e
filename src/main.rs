//! Chainfolio service entry point
//!
//! Boots the store, the market ticker and the HTTP/WebSocket API, and tears
//! everything down on ctrl-c.

use anyhow::Result;
use chainfolio::config::AppConfig;
use chainfolio::market::MarketTicker;
use chainfolio::server::{self, AppState, BroadcastGate};
use chainfolio::simulation::SimulationEngine;
use chainfolio::storage::MemoryStore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!("starting chainfolio: {}", config.digest());

    let store = Arc::new(MemoryStore::new());
    store.seed_defaults().await;
    info!(
        assets = store.tracked_assets().await.len(),
        "market data seeded"
    );

    let gate = BroadcastGate::new(config.broadcast.clone());
    let engine = Arc::new(SimulationEngine::new(
        store.clone(),
        config.simulation.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ticker = MarketTicker::new(store.clone(), gate.clone(), config.ticker.clone());
    let ticker_handle = tokio::spawn(ticker.run(shutdown_rx.clone()));

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let state = AppState {
        store,
        engine,
        gate,
    };
    server::start(state, config.server.port, shutdown_rx).await?;

    if let Err(e) = ticker_handle.await {
        error!(error = %e, "market ticker task panicked");
    }

    info!("chainfolio stopped");
    Ok(())
}
