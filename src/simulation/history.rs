//! Synthetic historical price generator
//!
//! Produces a demo price series anchored to the asset's current price:
//! a bounded random walk scaled by the volatility factor plus a slow
//! sinusoidal component so the series is not pure noise.

use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate};
use rand::Rng;

/// Hard floor for every generated price
pub const PRICE_FLOOR: f64 = 0.01;

/// Generate `days` synthetic prices starting at `base_price`.
///
/// Day 0 is the base price itself; each following day applies a return of
/// `rand[-1,1] * volatility + sin(i/10) * 0.5 * volatility / 2`. Every price
/// is clamped to [`PRICE_FLOOR`] regardless of the random draw.
pub fn generate_series<R: Rng + ?Sized>(
    base_price: f64,
    days: usize,
    volatility: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if base_price <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "base price must be positive, got {base_price}"
        )));
    }
    if days == 0 {
        return Err(Error::InvalidInput("days must be positive".to_string()));
    }
    if volatility <= 0.0 || volatility >= 1.0 {
        return Err(Error::InvalidInput(format!(
            "volatility factor must be in (0, 1), got {volatility}"
        )));
    }

    let mut prices = Vec::with_capacity(days);
    prices.push(base_price.max(PRICE_FLOOR));

    for i in 1..days {
        let random_walk: f64 = rng.gen_range(-1.0..1.0);
        let cycle = (i as f64 / 10.0).sin() * 0.5;
        let change = random_walk * volatility + cycle * volatility / 2.0;

        let prev = prices[i - 1];
        prices.push((prev * (1.0 + change)).max(PRICE_FLOOR));
    }

    Ok(prices)
}

/// Consecutive ISO date labels (`YYYY-MM-DD`) starting at `start`
pub fn date_range(start: NaiveDate, days: usize) -> Vec<String> {
    (0..days)
        .map(|i| (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string())
        .collect()
}
