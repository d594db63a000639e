//! Configuration management for Chainfolio
//!
//! Loads from optional config files + environment variables via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub ticker: TickerConfig,
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP/WebSocket listen port
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Days of synthetic history generated per run
    pub historical_days: usize,
    /// Days predicted ahead of the series
    pub forecast_days: usize,
    /// Sliding-window width for the trend model
    pub window_size: usize,
    /// Volatility factor for the synthetic history, must stay in (0, 1)
    pub history_volatility: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickerConfig {
    /// Seconds between market-data ticks
    pub interval_secs: u64,
    /// Maximum symmetric price move per tick (fraction, 0.005 = ±0.5%)
    pub price_jitter: f64,
    /// Maximum symmetric 24h-change move per tick (percentage points)
    pub change_jitter: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Minimum milliseconds between two market-data broadcasts
    pub throttle_ms: i64,
    /// Broadcast channel capacity per subscriber
    pub capacity: usize,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Server defaults
            .set_default("server.port", 8080)?
            // Simulation defaults
            .set_default("simulation.historical_days", 30)?
            .set_default("simulation.forecast_days", 7)?
            .set_default("simulation.window_size", 10)?
            .set_default("simulation.history_volatility", 0.03)?
            // Ticker defaults
            .set_default("ticker.interval_secs", 10)?
            .set_default("ticker.price_jitter", 0.005)?
            .set_default("ticker.change_jitter", 0.1)?
            // Broadcast defaults
            .set_default("broadcast.throttle_ms", 5000)?
            .set_default("broadcast.capacity", 100)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (CHAINFOLIO_*)
            .add_source(Environment::with_prefix("CHAINFOLIO").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config for startup logging
    pub fn digest(&self) -> String {
        format!(
            "port={} history={}d forecast={}d window={} tick={}s throttle={}ms",
            self.server.port,
            self.simulation.historical_days,
            self.simulation.forecast_days,
            self.simulation.window_size,
            self.ticker.interval_secs,
            self.broadcast.throttle_ms
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            historical_days: 30,
            forecast_days: 7,
            window_size: 10,
            history_volatility: 0.03,
        }
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            price_jitter: 0.005,
            change_jitter: 0.1,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 5000,
            capacity: 100,
        }
    }
}
