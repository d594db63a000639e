//! Core types used throughout Chainfolio
//!
//! Defines the persisted record shapes and the tier enums shared by the
//! simulation engine, the market ticker and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volatility rating assigned to a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatilityTier {
    Low,
    Medium,
    High,
}

impl VolatilityTier {
    /// Classify a volatility score in [0, 1)
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            VolatilityTier::Low
        } else if score < 0.7 {
            VolatilityTier::Medium
        } else {
            VolatilityTier::High
        }
    }

    /// Prediction-bound multiplier for this tier
    pub fn bound_multiplier(&self) -> f64 {
        match self {
            VolatilityTier::Low => 0.05,
            VolatilityTier::Medium => 0.15,
            VolatilityTier::High => 0.25,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(VolatilityTier::Low),
            "medium" => Some(VolatilityTier::Medium),
            "high" => Some(VolatilityTier::High),
            _ => None,
        }
    }
}

impl fmt::Display for VolatilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilityTier::Low => write!(f, "Low"),
            VolatilityTier::Medium => write!(f, "Medium"),
            VolatilityTier::High => write!(f, "High"),
        }
    }
}

/// Market-liquidity impact rating.
///
/// Thresholds run opposite to [`VolatilityTier`]: a low volume score means
/// thin liquidity, which means *high* impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidityImpact {
    Low,
    Medium,
    High,
}

impl LiquidityImpact {
    /// Classify a volume score in [0, 1)
    pub fn from_volume_score(score: f64) -> Self {
        if score < 0.3 {
            LiquidityImpact::High
        } else if score < 0.7 {
            LiquidityImpact::Medium
        } else {
            LiquidityImpact::Low
        }
    }
}

impl fmt::Display for LiquidityImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiquidityImpact::Low => write!(f, "Low"),
            LiquidityImpact::Medium => write!(f, "Medium"),
            LiquidityImpact::High => write!(f, "High"),
        }
    }
}

/// Gas-price tiers in gwei, present only for the native-chain asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasTiers {
    pub slow: f64,
    pub average: f64,
    pub fast: f64,
}

/// Market data for one tracked asset.
///
/// One record per asset name (uniqueness enforced by the store). Mutated in
/// place by the ticker and the market-data PATCH endpoint; price stays > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRecord {
    pub id: i64,
    pub asset: String,
    pub ticker: String,
    pub price: f64,
    /// 24h change in percent (e.g. 2.4 = +2.4%)
    pub change_24h: f64,
    pub volume_24h: Option<f64>,
    pub gas_price_gwei: Option<f64>,
    pub gas_tiers: Option<GasTiers>,
    /// Last mutation timestamp in milliseconds
    pub updated_at: i64,
}

/// Chart series of a simulation, aligned by index.
///
/// Historical entries carry `actual` values and `None` predictions; the
/// future segment carries predictions/bounds and `None` actuals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationChart {
    pub dates: Vec<String>,
    pub actual: Vec<Option<f64>>,
    pub predicted: Vec<Option<f64>>,
    pub upper_bound: Vec<Option<f64>>,
    pub lower_bound: Vec<Option<f64>>,
}

/// Persisted result of one simulation run. Immutable once created;
/// removed only by an explicit delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub asset: String,
    /// Last predicted price at the end of the forecast horizon
    pub prediction: f64,
    /// Confidence in percent (0-100)
    pub confidence_pct: u8,
    pub volatility: VolatilityTier,
    pub upper_bound: f64,
    pub lower_bound: f64,
    pub recommendation: String,
    /// Projected annual yield in percent
    pub yield_pct: f64,
    /// Estimated transaction gas cost in USD
    pub gas_fee_usd: f64,
    pub impermanent_loss_pct: f64,
    pub liquidity_impact: LiquidityImpact,
    pub break_even_price: f64,
    pub chart: SimulationChart,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volatility_tier_thresholds() {
        assert_eq!(VolatilityTier::from_score(0.0), VolatilityTier::Low);
        assert_eq!(VolatilityTier::from_score(0.29), VolatilityTier::Low);
        assert_eq!(VolatilityTier::from_score(0.3), VolatilityTier::Medium);
        assert_eq!(VolatilityTier::from_score(0.69), VolatilityTier::Medium);
        assert_eq!(VolatilityTier::from_score(0.7), VolatilityTier::High);
        assert_eq!(VolatilityTier::from_score(0.99), VolatilityTier::High);
    }

    #[test]
    fn liquidity_impact_inverts_thresholds() {
        assert_eq!(
            LiquidityImpact::from_volume_score(0.1),
            LiquidityImpact::High
        );
        assert_eq!(
            LiquidityImpact::from_volume_score(0.5),
            LiquidityImpact::Medium
        );
        assert_eq!(
            LiquidityImpact::from_volume_score(0.9),
            LiquidityImpact::Low
        );
    }

    #[test]
    fn bound_multipliers_by_tier() {
        assert!((VolatilityTier::Low.bound_multiplier() - 0.05).abs() < 1e-12);
        assert!((VolatilityTier::Medium.bound_multiplier() - 0.15).abs() < 1e-12);
        assert!((VolatilityTier::High.bound_multiplier() - 0.25).abs() < 1e-12);
    }
}
