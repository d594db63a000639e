//! Simulation engine
//!
//! Wires the pipeline for one "run simulation for asset X" request:
//! market lookup -> synthetic history -> trend fit -> forecast -> risk
//! estimate -> recommendation -> aligned chart -> atomic persist. Runs share
//! no mutable state until the final insert, so concurrent requests need no
//! coordination.

pub mod forecaster;
pub mod history;
pub mod recommend;
pub mod risk;

use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::storage::{MemoryStore, NewSimulation};
use crate::types::{SimulationChart, SimulationRecord};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info};

/// Round to 2 decimals for stored/chart values
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Runs price simulations and owns their persistence
pub struct SimulationEngine {
    store: Arc<MemoryStore>,
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(store: Arc<MemoryStore>, config: SimulationConfig) -> Self {
        Self { store, config }
    }

    /// Run a simulation for `asset` on behalf of `user_id`
    pub async fn run(&self, user_id: i64, asset: &str) -> Result<SimulationRecord> {
        let mut rng = StdRng::from_entropy();
        self.run_with_rng(user_id, asset, &mut rng).await
    }

    /// Run with an explicit random source (deterministic under a seeded rng)
    pub async fn run_with_rng<R: Rng + ?Sized>(
        &self,
        user_id: i64,
        asset: &str,
        rng: &mut R,
    ) -> Result<SimulationRecord> {
        // Snapshot-read: the current price is taken once and never re-read,
        // so a concurrent tick lands entirely before or after this run.
        let market = self
            .store
            .market_data_for(asset)
            .await
            .ok_or_else(|| Error::AssetNotFound(asset.to_string()))?;

        let historical_days = self.config.historical_days;
        let forecast_days = self.config.forecast_days;

        let series = history::generate_series(
            market.price,
            historical_days,
            self.config.history_volatility,
            rng,
        )?;

        let model = forecaster::TrendModel::fit(&series, self.config.window_size)?;
        let predictions = model.forecast(&series, forecast_days)?;

        let estimate = risk::estimate(&series, &predictions, market.gas_price_gwei, rng)?;

        let last_actual = series[series.len() - 1];
        let last_prediction = predictions[predictions.len() - 1];
        let recommendation = recommend::recommendation(asset, last_actual, last_prediction);

        debug!(
            asset,
            last_actual,
            last_prediction,
            tier = %estimate.volatility,
            "simulation pipeline complete"
        );

        let chart = build_chart(&series, &predictions, &estimate, forecast_days);

        let record = self
            .store
            .create_simulation(NewSimulation {
                user_id,
                name: format!("{asset} Price Prediction"),
                asset: asset.to_string(),
                prediction: round2(last_prediction),
                confidence_pct: estimate.confidence_pct,
                volatility: estimate.volatility,
                upper_bound: round2(estimate.upper_bounds[estimate.upper_bounds.len() - 1]),
                lower_bound: round2(estimate.lower_bounds[estimate.lower_bounds.len() - 1]),
                recommendation,
                yield_pct: round2(estimate.yield_pct),
                gas_fee_usd: round2(estimate.gas_fee_usd),
                impermanent_loss_pct: round2(estimate.impermanent_loss_pct),
                liquidity_impact: estimate.liquidity_impact,
                break_even_price: round2(estimate.break_even_price),
                chart,
            })
            .await;

        info!(asset, id = record.id, user_id, "simulation persisted");
        Ok(record)
    }

    /// Simulations stored for one user, oldest first
    pub async fn list(&self, user_id: i64) -> Vec<SimulationRecord> {
        self.store.simulations_for(user_id).await
    }

    /// Delete a stored simulation; deleting an unknown id is an error
    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.store.delete_simulation(id).await {
            Ok(())
        } else {
            Err(Error::NotFound(id))
        }
    }
}

/// Assemble the aligned chart: historical actuals followed by `None`s, and
/// `None`-padded prediction/bound columns covering only the future segment.
fn build_chart(
    series: &[f64],
    predictions: &[f64],
    estimate: &risk::RiskEstimate,
    forecast_days: usize,
) -> SimulationChart {
    let historical_days = series.len();
    let today = Utc::now().date_naive();
    let dates = history::date_range(
        today - Duration::days(historical_days as i64),
        historical_days + forecast_days,
    );

    let mut actual: Vec<Option<f64>> = series.iter().map(|p| Some(round2(*p))).collect();
    actual.extend(std::iter::repeat(None).take(forecast_days));

    let pad = |values: &[f64]| -> Vec<Option<f64>> {
        let mut column: Vec<Option<f64>> = vec![None; historical_days];
        column.extend(values.iter().map(|v| Some(round2(*v))));
        column
    };

    SimulationChart {
        dates,
        actual,
        predicted: pad(predictions),
        upper_bound: pad(&estimate.upper_bounds),
        lower_bound: pad(&estimate.lower_bounds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LiquidityImpact;

    fn sample_estimate(predictions: &[f64]) -> risk::RiskEstimate {
        let (upper_bounds, lower_bounds) =
            risk::bounds_for_tier(predictions, crate::types::VolatilityTier::Low);
        risk::RiskEstimate {
            confidence_pct: 90,
            volatility: crate::types::VolatilityTier::Low,
            upper_bounds,
            lower_bounds,
            yield_pct: 7.0,
            gas_fee_usd: 120.0,
            impermanent_loss_pct: 0.1,
            liquidity_impact: LiquidityImpact::Low,
            break_even_price: 100.3,
        }
    }

    #[test]
    fn chart_alignment_pads_with_nones() {
        let series: Vec<f64> = (1..=30).map(f64::from).collect();
        let predictions = vec![31.0, 32.0, 33.0, 34.0, 35.0, 36.0, 37.0];
        let estimate = sample_estimate(&predictions);

        let chart = build_chart(&series, &predictions, &estimate, 7);

        assert_eq!(chart.dates.len(), 37);
        assert_eq!(chart.actual.len(), 37);
        assert_eq!(chart.predicted.len(), 37);

        assert!(chart.actual[..30].iter().all(Option::is_some));
        assert!(chart.actual[30..].iter().all(Option::is_none));
        assert!(chart.predicted[..30].iter().all(Option::is_none));
        assert!(chart.predicted[30..].iter().all(Option::is_some));
        assert!(chart.upper_bound[..30].iter().all(Option::is_none));
        assert!(chart.lower_bound[30..].iter().all(Option::is_some));
    }

    #[test]
    fn chart_values_are_rounded_to_cents() {
        let series = vec![10.0, 10.123456, 10.987654];
        let predictions = vec![11.005];
        let estimate = sample_estimate(&predictions);

        let chart = build_chart(&series, &predictions, &estimate, 1);
        assert_eq!(chart.actual[1], Some(10.12));
        assert_eq!(chart.actual[2], Some(10.99));
    }
}
