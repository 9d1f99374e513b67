//! Configuration for the trade watcher.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details
//! - CLI arguments: window, currency and backfill parameters

use clap::Parser;
use trade_watch::fill::WatchConfig;

/// Environment configuration (connection details).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Chain ID to watch (default: 1, mainnet)
    pub chain_id: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

/// CLI arguments for the watch parameters.
#[derive(Debug, Parser)]
#[command(name = "trade-watch")]
#[command(about = "Watches DEX fill events and derives rolling trade statistics")]
pub struct CliConfig {
    /// Fiat currency code used for price conversions
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Statistics window in seconds
    #[arg(long, default_value_t = 86_400)]
    pub window: u64,

    /// Blocks per backfill batch (default: sized from the window)
    #[arg(long)]
    pub block_fetch_count: Option<u64>,
}

impl CliConfig {
    /// Convert CLI arguments to the watch configuration.
    pub fn to_watch_config(&self) -> Result<WatchConfig, ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.currency.is_empty() || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidCurrency(self.currency.clone()));
        }

        let mut config = WatchConfig::new()
            .with_window(self.window)
            .with_currency(&self.currency.to_ascii_uppercase());
        if let Some(count) = self.block_fetch_count {
            if count == 0 {
                return Err(ConfigError::ZeroBlockFetchCount);
            }
            config = config.with_block_fetch_count(count);
        }
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("window cannot be zero")]
    ZeroWindow,

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("block fetch count cannot be zero")]
    ZeroBlockFetchCount,
}
