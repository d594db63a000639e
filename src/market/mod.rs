//! Market ticker
//!
//! Periodically nudges every tracked asset's price and 24h change within
//! small symmetric bounds, then hands the post-tick snapshot to the
//! broadcast gate. A failed asset update is logged and skipped; the rest of
//! the cycle proceeds and the asset is retried on the next tick.

use crate::config::TickerConfig;
use crate::server::broadcast::BroadcastGate;
use crate::simulation::history::PRICE_FLOOR;
use crate::storage::MemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodic market-data mutation task
pub struct MarketTicker {
    store: Arc<MemoryStore>,
    gate: BroadcastGate,
    config: TickerConfig,
}

impl MarketTicker {
    pub fn new(store: Arc<MemoryStore>, gate: BroadcastGate, config: TickerConfig) -> Self {
        Self {
            store,
            gate,
            config,
        }
    }

    /// Drive ticks until the shutdown flag flips. Broadcasting is a channel
    /// send, so a slow subscriber never delays the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rng = StdRng::from_entropy();

        info!(interval_secs = self.config.interval_secs, "market ticker started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_once(&mut rng).await;
                    let snapshot = self.store.all_market_data().await;
                    self.gate.maybe_broadcast(&snapshot);
                }
                changed = shutdown.changed() => {
                    // A dropped sender also means the service is going down.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("market ticker stopped");
    }

    /// Apply one perturbation cycle to every tracked asset
    pub async fn tick_once<R: Rng + ?Sized>(&self, rng: &mut R) {
        let assets = self.store.tracked_assets().await;

        for asset in assets {
            let price_move = rng.gen_range(-self.config.price_jitter..self.config.price_jitter);
            let change_move =
                rng.gen_range(-self.config.change_jitter..self.config.change_jitter);

            let updated = self
                .store
                .update_market(&asset, |record| {
                    record.price = (record.price * (1.0 + price_move)).max(PRICE_FLOOR);
                    record.change_24h += change_move;
                })
                .await;

            match updated {
                Some(record) => {
                    debug!(asset = %record.asset, price = record.price, "tick applied");
                }
                None => {
                    // Asset vanished between snapshot and update; next tick
                    // picks up whatever the store holds then.
                    warn!(%asset, "tick skipped, asset no longer tracked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BroadcastConfig;

    fn ticker_with_store() -> (MarketTicker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let gate = BroadcastGate::new(BroadcastConfig::default());
        let ticker = MarketTicker::new(store.clone(), gate, TickerConfig::default());
        (ticker, store)
    }

    #[tokio::test]
    async fn tick_moves_prices_within_bounds() {
        let (ticker, store) = ticker_with_store();
        store.seed_defaults().await;
        let before = store.all_market_data().await;

        let mut rng = StdRng::seed_from_u64(21);
        ticker.tick_once(&mut rng).await;

        let after = store.all_market_data().await;
        for (old, new) in before.iter().zip(after.iter()) {
            let price_move = (new.price - old.price).abs() / old.price;
            assert!(price_move <= 0.005, "price moved {price_move} on {}", old.asset);
            assert!(new.price > 0.0);

            let change_move = (new.change_24h - old.change_24h).abs();
            assert!(change_move <= 0.1, "change moved {change_move}");
            assert!(new.updated_at >= old.updated_at);
        }
    }

    #[tokio::test]
    async fn price_never_drops_below_floor() {
        let (ticker, store) = ticker_with_store();
        store
            .insert_market("Dustcoin", "DUST", PRICE_FLOOR, 0.0, None, None, None)
            .await;

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            ticker.tick_once(&mut rng).await;
        }

        let record = store.market_data_for("Dustcoin").await.unwrap();
        assert!(record.price >= PRICE_FLOOR);
    }

    #[tokio::test]
    async fn empty_store_ticks_without_effect() {
        let (ticker, store) = ticker_with_store();
        let mut rng = StdRng::seed_from_u64(1);
        ticker.tick_once(&mut rng).await;
        assert!(store.all_market_data().await.is_empty());
    }
}
