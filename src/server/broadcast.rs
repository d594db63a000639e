//! Throttled market-data broadcaster
//!
//! Fans market snapshots out to every connected WebSocket client through a
//! broadcast channel, holding a minimum interval between sends. Skips are
//! all-or-nothing: within the throttle window nobody receives the tick.
//! Connect-time snapshots are built here too but pushed directly on the new
//! socket, outside the throttle.

use crate::config::BroadcastConfig;
use crate::server::types::WsMessage;
use crate::types::MarketRecord;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Channel plus throttle state for market-data fan-out
#[derive(Debug, Clone)]
pub struct BroadcastGate {
    tx: broadcast::Sender<String>,
    last_broadcast_ms: Arc<Mutex<i64>>,
    throttle_ms: i64,
}

impl BroadcastGate {
    pub fn new(config: BroadcastConfig) -> Self {
        let (tx, _) = broadcast::channel(config.capacity);
        Self {
            tx,
            last_broadcast_ms: Arc::new(Mutex::new(0)),
            throttle_ms: config.throttle_ms,
        }
    }

    /// Register a new subscriber. Dropping the receiver deregisters it.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Serialized snapshot message for a connect-time push. Does not touch
    /// the throttle state.
    pub fn snapshot_message(&self, records: &[MarketRecord]) -> serde_json::Result<String> {
        serde_json::to_string(&WsMessage::MarketData(records.to_vec()))
    }

    /// Broadcast the snapshot unless a broadcast went out within the
    /// throttle window. Returns whether a broadcast happened.
    pub fn maybe_broadcast(&self, records: &[MarketRecord]) -> bool {
        self.maybe_broadcast_at(chrono::Utc::now().timestamp_millis(), records)
    }

    /// Broadcast with an explicit clock reading (deterministic in tests)
    pub fn maybe_broadcast_at(&self, now_ms: i64, records: &[MarketRecord]) -> bool {
        let mut last = match self.last_broadcast_ms.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let elapsed = now_ms - *last;
        if elapsed <= self.throttle_ms {
            debug!(elapsed_ms = elapsed, "skipping broadcast, too soon since last update");
            return false;
        }

        match self.snapshot_message(records) {
            Ok(json) => {
                // No receivers is fine; they may connect later.
                let sent = self.tx.send(json).unwrap_or(0);
                debug!(subscribers = sent, "broadcasting market data");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize market snapshot");
                return false;
            }
        }

        *last = now_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<MarketRecord> {
        vec![MarketRecord {
            id: 1,
            asset: "Ethereum".to_string(),
            ticker: "ETH".to_string(),
            price: 3245.67,
            change_24h: 2.4,
            volume_24h: Some(12_345_678.0),
            gas_price_gwei: Some(34.2),
            gas_tiers: None,
            updated_at: 0,
        }]
    }

    #[tokio::test]
    async fn throttle_collapses_close_ticks() {
        let gate = BroadcastGate::new(BroadcastConfig {
            throttle_ms: 5000,
            capacity: 16,
        });
        let mut rx = gate.subscribe();
        let records = sample_records();

        let t0 = 1_000_000;
        assert!(gate.maybe_broadcast_at(t0, &records));
        // 1 second later: suppressed.
        assert!(!gate.maybe_broadcast_at(t0 + 1_000, &records));
        // 6 seconds after the first: goes out.
        assert!(gate.maybe_broadcast_at(t0 + 6_000, &records));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "expected exactly two broadcasts");
    }

    #[tokio::test]
    async fn connect_snapshot_does_not_reset_throttle() {
        let gate = BroadcastGate::new(BroadcastConfig {
            throttle_ms: 5000,
            capacity: 16,
        });
        let records = sample_records();

        let t0 = 50_000;
        assert!(gate.maybe_broadcast_at(t0, &records));

        // A subscriber connecting 100ms later gets its own snapshot...
        let msg = gate.snapshot_message(&records).unwrap();
        assert!(msg.contains("\"MARKET_DATA\""));

        // ...while the shared throttle window is unaffected.
        assert!(!gate.maybe_broadcast_at(t0 + 1_000, &records));
        assert!(gate.maybe_broadcast_at(t0 + 5_001, &records));
    }

    #[tokio::test]
    async fn message_carries_type_and_data_fields() {
        let gate = BroadcastGate::new(BroadcastConfig::default());
        let json = gate.snapshot_message(&sample_records()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "MARKET_DATA");
        assert_eq!(value["data"][0]["asset"], "Ethereum");
        assert_eq!(value["data"][0]["ticker"], "ETH");
    }
}
