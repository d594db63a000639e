//! In-memory record store
//!
//! Owns the two persisted record families: market data (one record per
//! asset, unique by asset name) and simulation results. Every mutation goes
//! through a write lock one record at a time, so readers always observe a
//! record either before or after a tick, never mid-write. Snapshots are
//! clones taken under the read lock.

use crate::types::{GasTiers, MarketRecord, SimulationRecord};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// Shared in-memory store for market data and simulation results
#[derive(Debug)]
pub struct MemoryStore {
    /// Market records keyed by asset name
    market: RwLock<HashMap<String, MarketRecord>>,
    /// Simulation records keyed by id
    simulations: RwLock<HashMap<i64, SimulationRecord>>,
    next_market_id: AtomicI64,
    next_simulation_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            market: RwLock::new(HashMap::new()),
            simulations: RwLock::new(HashMap::new()),
            next_market_id: AtomicI64::new(1),
            next_simulation_id: AtomicI64::new(1),
        }
    }

    /// Seed the default tracked assets
    pub async fn seed_defaults(&self) {
        self.insert_market(
            "Ethereum",
            "ETH",
            3245.67,
            2.4,
            Some(12_345_678.0),
            Some(34.2),
            Some(GasTiers {
                slow: 24.0,
                average: 34.0,
                fast: 48.0,
            }),
        )
        .await;
        self.insert_market("Chainlink", "LINK", 13.00, -1.2, Some(98_765_432.0), None, None)
            .await;
    }

    /// Insert a market record. Replaces any existing record for the same
    /// asset name, keeping uniqueness by asset.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_market(
        &self,
        asset: &str,
        ticker: &str,
        price: f64,
        change_24h: f64,
        volume_24h: Option<f64>,
        gas_price_gwei: Option<f64>,
        gas_tiers: Option<GasTiers>,
    ) -> MarketRecord {
        let record = MarketRecord {
            id: self.next_market_id.fetch_add(1, Ordering::SeqCst),
            asset: asset.to_string(),
            ticker: ticker.to_string(),
            price,
            change_24h,
            volume_24h,
            gas_price_gwei,
            gas_tiers,
            updated_at: Utc::now().timestamp_millis(),
        };
        let mut market = self.market.write().await;
        market.insert(record.asset.clone(), record.clone());
        record
    }

    /// Point-in-time snapshot of all market records, ordered by id
    pub async fn all_market_data(&self) -> Vec<MarketRecord> {
        let market = self.market.read().await;
        let mut records: Vec<MarketRecord> = market.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Current market record for one asset
    pub async fn market_data_for(&self, asset: &str) -> Option<MarketRecord> {
        self.market.read().await.get(asset).cloned()
    }

    /// Names of all tracked assets, ordered by record id
    pub async fn tracked_assets(&self) -> Vec<String> {
        self.all_market_data()
            .await
            .into_iter()
            .map(|r| r.asset)
            .collect()
    }

    /// Mutate one market record under the write lock. The closure sees the
    /// record in place; `updated_at` is stamped afterwards. Returns the
    /// updated record, or `None` when the asset is unknown.
    pub async fn update_market<F>(&self, asset: &str, mutate: F) -> Option<MarketRecord>
    where
        F: FnOnce(&mut MarketRecord),
    {
        let mut market = self.market.write().await;
        let record = market.get_mut(asset)?;
        mutate(record);
        record.updated_at = Utc::now().timestamp_millis();
        Some(record.clone())
    }

    /// Persist a fully-formed simulation result. The id and creation
    /// timestamp are assigned here, and the record becomes visible to
    /// readers in one step.
    pub async fn create_simulation(&self, record: NewSimulation) -> SimulationRecord {
        let record = SimulationRecord {
            id: self.next_simulation_id.fetch_add(1, Ordering::SeqCst),
            user_id: record.user_id,
            name: record.name,
            asset: record.asset,
            prediction: record.prediction,
            confidence_pct: record.confidence_pct,
            volatility: record.volatility,
            upper_bound: record.upper_bound,
            lower_bound: record.lower_bound,
            recommendation: record.recommendation,
            yield_pct: record.yield_pct,
            gas_fee_usd: record.gas_fee_usd,
            impermanent_loss_pct: record.impermanent_loss_pct,
            liquidity_impact: record.liquidity_impact,
            break_even_price: record.break_even_price,
            chart: record.chart,
            created_at: Utc::now(),
        };
        let mut simulations = self.simulations.write().await;
        simulations.insert(record.id, record.clone());
        record
    }

    pub async fn simulation(&self, id: i64) -> Option<SimulationRecord> {
        self.simulations.read().await.get(&id).cloned()
    }

    /// All simulation records for one user, ordered by id
    pub async fn simulations_for(&self, user_id: i64) -> Vec<SimulationRecord> {
        let simulations = self.simulations.read().await;
        let mut records: Vec<SimulationRecord> = simulations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Remove a simulation record. Returns false when no record existed.
    pub async fn delete_simulation(&self, id: i64) -> bool {
        self.simulations.write().await.remove(&id).is_some()
    }

    /// Total number of stored simulation records
    pub async fn simulation_count(&self) -> usize {
        self.simulations.read().await.len()
    }
}

/// Fields of a simulation result before the store assigns id/created_at
#[derive(Debug, Clone)]
pub struct NewSimulation {
    pub user_id: i64,
    pub name: String,
    pub asset: String,
    pub prediction: f64,
    pub confidence_pct: u8,
    pub volatility: crate::types::VolatilityTier,
    pub upper_bound: f64,
    pub lower_bound: f64,
    pub recommendation: String,
    pub yield_pct: f64,
    pub gas_fee_usd: f64,
    pub impermanent_loss_pct: f64,
    pub liquidity_impact: crate::types::LiquidityImpact,
    pub break_even_price: f64,
    pub chart: crate::types::SimulationChart,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LiquidityImpact, SimulationChart, VolatilityTier};

    fn sample_simulation(user_id: i64) -> NewSimulation {
        NewSimulation {
            user_id,
            name: "Ethereum Price Prediction".to_string(),
            asset: "Ethereum".to_string(),
            prediction: 3300.0,
            confidence_pct: 85,
            volatility: VolatilityTier::Medium,
            upper_bound: 3795.0,
            lower_bound: 2805.0,
            recommendation: "maintain".to_string(),
            yield_pct: 8.2,
            gas_fee_usd: 140.0,
            impermanent_loss_pct: 0.1,
            liquidity_impact: LiquidityImpact::Low,
            break_even_price: 3255.4,
            chart: SimulationChart {
                dates: vec![],
                actual: vec![],
                predicted: vec![],
                upper_bound: vec![],
                lower_bound: vec![],
            },
        }
    }

    #[tokio::test]
    async fn seed_defaults_tracks_two_assets() {
        let store = MemoryStore::new();
        store.seed_defaults().await;

        let records = store.all_market_data().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].asset, "Ethereum");
        assert_eq!(records[1].asset, "Chainlink");
        assert!(records[0].gas_tiers.is_some());
        assert!(records[1].gas_tiers.is_none());
    }

    #[tokio::test]
    async fn market_records_are_unique_by_asset() {
        let store = MemoryStore::new();
        store
            .insert_market("Ethereum", "ETH", 3000.0, 1.0, None, None, None)
            .await;
        store
            .insert_market("Ethereum", "ETH", 3100.0, 2.0, None, None, None)
            .await;

        let records = store.all_market_data().await;
        assert_eq!(records.len(), 1);
        assert!((records[0].price - 3100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn update_market_stamps_timestamp_and_returns_record() {
        let store = MemoryStore::new();
        store.seed_defaults().await;

        let updated = store
            .update_market("Ethereum", |record| record.price = 4000.0)
            .await
            .expect("Ethereum should exist");
        assert!((updated.price - 4000.0).abs() < f64::EPSILON);
        assert!(updated.updated_at > 0);

        let missing = store.update_market("Dogecoin", |_| {}).await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn simulations_are_scoped_per_user_and_deletable() {
        let store = MemoryStore::new();
        let first = store.create_simulation(sample_simulation(1)).await;
        store.create_simulation(sample_simulation(2)).await;

        let mine = store.simulations_for(1).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);

        assert!(store.delete_simulation(first.id).await);
        assert!(!store.delete_simulation(first.id).await);
        assert_eq!(store.simulations_for(1).await.len(), 0);
    }
}
