//! Position recommendation
//!
//! Pure mapping from the last actual vs. predicted price delta to a
//! human-readable suggestion. Moves within ±5% read as "hold".

/// Percent delta beyond which a position change is suggested
const ACTION_THRESHOLD_PCT: f64 = 5.0;

/// Build the recommendation text for a forecast.
///
/// The suggested adjustment is half the projected move, rounded to a whole
/// percent.
pub fn recommendation(asset: &str, last_actual: f64, last_predicted: f64) -> String {
    let delta_pct = (last_predicted - last_actual) / last_actual * 100.0;

    if delta_pct > ACTION_THRESHOLD_PCT {
        format!(
            "Consider increasing your {} position by {}% based on current simulation data.",
            asset,
            (delta_pct / 2.0).round()
        )
    } else if delta_pct < -ACTION_THRESHOLD_PCT {
        format!(
            "Consider reducing your {} position by {}% based on current simulation data.",
            asset,
            (delta_pct.abs() / 2.0).round()
        )
    } else {
        format!(
            "Your current {asset} position appears optimal based on simulation data. \
             Consider maintaining current levels."
        )
    }
}
