//! Windowed trend forecaster
//!
//! Fits a least-squares linear model over sliding windows of the historical
//! series (window -> next price) with SmartCore, then predicts iteratively:
//! each prediction is appended to the window and the oldest entry dropped.
//! Errors compound across the horizon; that is the accepted behavior of the
//! autoregressive loop.

use crate::error::{Error, Result};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};

/// Trend model fitted to one historical series, constructed fresh per run
#[derive(Debug)]
pub struct TrendModel {
    model: LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    window_size: usize,
}

impl TrendModel {
    /// Fit the model on sliding windows over `series`.
    ///
    /// Requires `series.len() > window_size`, otherwise not a single
    /// training example can be formed.
    pub fn fit(series: &[f64], window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::InvalidInput(
                "window size must be positive".to_string(),
            ));
        }
        if series.len() <= window_size {
            return Err(Error::InsufficientData {
                have: series.len(),
                need: window_size,
            });
        }

        let mut windows: Vec<&[f64]> = Vec::new();
        let mut targets: Vec<f64> = Vec::new();
        for start in 0..series.len() - window_size {
            windows.push(&series[start..start + window_size]);
            targets.push(series[start + window_size]);
        }

        let x = DenseMatrix::from_2d_array(&windows)
            .map_err(|e| anyhow::anyhow!("failed to build training matrix: {e}"))?;
        let model = LinearRegression::fit(&x, &targets, LinearRegressionParameters::default())
            .map_err(|e| anyhow::anyhow!("trend model fit failed: {e}"))?;

        Ok(Self { model, window_size })
    }

    /// Predict the price following `window` (must match the fitted width)
    pub fn predict_next(&self, window: &[f64]) -> Result<f64> {
        if window.len() != self.window_size {
            return Err(Error::InvalidInput(format!(
                "prediction window has {} entries, model expects {}",
                window.len(),
                self.window_size
            )));
        }
        let x = DenseMatrix::from_2d_array(&[window])
            .map_err(|e| anyhow::anyhow!("failed to build prediction input: {e}"))?;
        let predicted = self
            .model
            .predict(&x)
            .map_err(|e| anyhow::anyhow!("trend model prediction failed: {e}"))?;
        predicted
            .first()
            .copied()
            .ok_or_else(|| Error::SimulationFailed(anyhow::anyhow!("model returned no prediction")))
    }

    /// Predict `future_days` prices past the end of `series`, feeding each
    /// prediction back into the window. Values stay fractional; rounding is
    /// left to the caller.
    pub fn forecast(&self, series: &[f64], future_days: usize) -> Result<Vec<f64>> {
        if series.len() < self.window_size {
            return Err(Error::InsufficientData {
                have: series.len(),
                need: self.window_size,
            });
        }

        let mut window: Vec<f64> = series[series.len() - self.window_size..].to_vec();
        let mut predictions = Vec::with_capacity(future_days);

        for _ in 0..future_days {
            let next = self.predict_next(&window)?;
            predictions.push(next);
            window.remove(0);
            window.push(next);
        }

        Ok(predictions)
    }
}
