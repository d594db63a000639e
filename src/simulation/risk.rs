//! Bounds and risk estimation
//!
//! Derives the confidence/volatility rating, prediction bounds and the
//! auxiliary position metrics (yield, gas, impermanent loss, liquidity
//! impact, break-even) from a forecast. All stochastic inputs come from the
//! injected rng so a seeded source reproduces every field.

use crate::error::{Error, Result};
use crate::types::{LiquidityImpact, VolatilityTier};
use rand::Rng;

/// Damping applied to the volatility score when deriving confidence
pub const CONFIDENCE_DAMPING: f64 = 0.3;
/// Round-trip transaction cost in percent used for the break-even price
pub const TRANSACTION_COST_PCT: f64 = 0.3;
/// Fallback base gas price in gwei for assets without gas data
pub const DEFAULT_BASE_GAS_GWEI: f64 = 25.0;

/// Risk metrics derived from one forecast
#[derive(Debug, Clone)]
pub struct RiskEstimate {
    pub confidence_pct: u8,
    pub volatility: VolatilityTier,
    pub upper_bounds: Vec<f64>,
    pub lower_bounds: Vec<f64>,
    pub yield_pct: f64,
    pub gas_fee_usd: f64,
    pub impermanent_loss_pct: f64,
    pub liquidity_impact: LiquidityImpact,
    pub break_even_price: f64,
}

/// Upper/lower bounds for a known tier.
///
/// Standalone so callers with an already-derived tier get the same
/// multipliers the stochastic path uses.
pub fn bounds_for_tier(predictions: &[f64], tier: VolatilityTier) -> (Vec<f64>, Vec<f64>) {
    let multiplier = tier.bound_multiplier();
    let upper = predictions.iter().map(|p| p * (1.0 + multiplier)).collect();
    let lower = predictions.iter().map(|p| p * (1.0 - multiplier)).collect();
    (upper, lower)
}

/// Impermanent loss in percent for a pool whose price ratio moved to `r`,
/// constant-product closed form `|2*sqrt(r)/(1+r) - 1| * 100`
pub fn impermanent_loss_pct(price_ratio: f64) -> f64 {
    ((2.0 * price_ratio.sqrt() / (1.0 + price_ratio)) - 1.0).abs() * 100.0
}

/// Derive all risk metrics for a forecast.
///
/// `base_gas_gwei` scales the gas estimate and comes from the asset's
/// market record when it has one.
pub fn estimate<R: Rng + ?Sized>(
    series: &[f64],
    predictions: &[f64],
    base_gas_gwei: Option<f64>,
    rng: &mut R,
) -> Result<RiskEstimate> {
    let last_actual = *series.last().ok_or_else(|| {
        Error::InvalidInput("cannot estimate risk on an empty series".to_string())
    })?;
    let last_prediction = *predictions.last().ok_or_else(|| {
        Error::InvalidInput("cannot estimate risk without predictions".to_string())
    })?;

    let volatility_score: f64 = rng.gen();
    let volatility = VolatilityTier::from_score(volatility_score);
    let (upper_bounds, lower_bounds) = bounds_for_tier(predictions, volatility);

    let confidence_pct =
        ((1.0 - volatility_score * CONFIDENCE_DAMPING) * 100.0).round() as u8;

    let delta_pct = (last_prediction - last_actual) / last_actual * 100.0;
    let price_deviation = delta_pct.abs() / 100.0;
    let impermanent_loss = impermanent_loss_pct(1.0 + price_deviation);

    let volume_score: f64 = rng.gen();
    let liquidity_impact = LiquidityImpact::from_volume_score(volume_score);

    let break_even_price = last_actual * (1.0 + TRANSACTION_COST_PCT / 100.0);

    let yield_pct = 5.0 + rng.gen::<f64>() * 10.0;
    let base_gas = base_gas_gwei.unwrap_or(DEFAULT_BASE_GAS_GWEI);
    let gas_fee_usd = base_gas * (3.0 + rng.gen::<f64>() * 2.0);

    Ok(RiskEstimate {
        confidence_pct,
        volatility,
        upper_bounds,
        lower_bounds,
        yield_pct,
        gas_fee_usd,
        impermanent_loss_pct: impermanent_loss,
        liquidity_impact,
        break_even_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tier_bounds_are_exact() {
        let predictions = vec![100.0, 250.5, 0.02];

        let (upper, lower) = bounds_for_tier(&predictions, VolatilityTier::Low);
        for (i, p) in predictions.iter().enumerate() {
            assert!((upper[i] - p * 1.05).abs() < 1e-9);
            assert!((lower[i] - p * 0.95).abs() < 1e-9);
        }

        let (upper, lower) = bounds_for_tier(&predictions, VolatilityTier::Medium);
        for (i, p) in predictions.iter().enumerate() {
            assert!((upper[i] - p * 1.15).abs() < 1e-9);
            assert!((lower[i] - p * 0.85).abs() < 1e-9);
        }

        let (upper, lower) = bounds_for_tier(&predictions, VolatilityTier::High);
        for (i, p) in predictions.iter().enumerate() {
            assert!((upper[i] - p * 1.25).abs() < 1e-9);
            assert!((lower[i] - p * 0.75).abs() < 1e-9);
        }
    }

    #[test]
    fn bounds_bracket_every_prediction() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let series = vec![90.0, 95.0, 100.0];
            let predictions = vec![101.0, 103.5, 99.2];

            let risk = estimate(&series, &predictions, Some(34.2), &mut rng).unwrap();
            for (i, p) in predictions.iter().enumerate() {
                assert!(risk.lower_bounds[i] <= *p);
                assert!(*p <= risk.upper_bounds[i]);
            }
        }
    }

    #[test]
    fn impermanent_loss_matches_closed_form() {
        // 100 -> 110 is a 10% deviation; IL = |2*sqrt(1.1)/2.1 - 1| * 100
        let il = impermanent_loss_pct(1.10);
        assert!((il - 0.1134).abs() < 1e-3, "got {il}");

        // No price movement, no loss.
        assert!(impermanent_loss_pct(1.0).abs() < 1e-12);
    }

    #[test]
    fn estimate_derives_il_from_last_points() {
        let mut rng = StdRng::seed_from_u64(5);
        let series = vec![100.0];
        let predictions = vec![110.0];

        let risk = estimate(&series, &predictions, None, &mut rng).unwrap();
        assert!((risk.impermanent_loss_pct - 0.1134).abs() < 1e-3);
    }

    #[test]
    fn break_even_applies_fixed_transaction_cost() {
        let mut rng = StdRng::seed_from_u64(9);
        let risk = estimate(&[100.0], &[100.0], None, &mut rng).unwrap();
        assert!((risk.break_even_price - 100.3).abs() < 1e-9);
    }

    #[test]
    fn stochastic_fields_stay_in_documented_ranges() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let risk = estimate(&[100.0], &[104.0], Some(34.2), &mut rng).unwrap();

            assert!((70..=100).contains(&risk.confidence_pct));
            assert!((5.0..15.0).contains(&risk.yield_pct));
            // gas = 34.2 * (3 + [0,2))
            assert!(risk.gas_fee_usd >= 34.2 * 3.0);
            assert!(risk.gas_fee_usd < 34.2 * 5.0);
        }
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            estimate(&[], &[100.0], None, &mut rng),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            estimate(&[100.0], &[], None, &mut rng),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn seeded_estimates_are_reproducible() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            estimate(&[100.0, 102.0], &[105.0, 108.0], Some(34.2), &mut rng).unwrap()
        };
        let a = run(42);
        let b = run(42);
        assert_eq!(a.confidence_pct, b.confidence_pct);
        assert_eq!(a.volatility, b.volatility);
        assert!((a.yield_pct - b.yield_pct).abs() < f64::EPSILON);
        assert!((a.gas_fee_usd - b.gas_fee_usd).abs() < f64::EPSILON);
    }
}
