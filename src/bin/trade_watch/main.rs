//! Trade watcher for a v1-style DEX.
//!
//! Connects to a node, backfills enough fill history to cover the
//! statistics window, then follows the chain tip and logs trades and
//! statistics snapshots as they arrive.

mod config;

use std::{process::exit, sync::Arc};

use alloy::{providers::ProviderBuilder, rpc::client::RpcClient};
use clap::Parser;
use tracing::{debug, error, info};
use trade_watch::{
    Chain,
    fill::{self, WatchEvent},
    registry::TokenRegistry,
};
use url::Url;

use config::{CliConfig, EnvConfig};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    let watch_config = match cli_config.to_watch_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse RPC URL
    let node_url = match Url::parse(&env_config.node_rpc_url) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("Invalid RPC URL: {}", e);
            exit(1);
        }
    };

    let chain_id = env_config.chain_id.unwrap_or(1);
    let chain = match Chain::known(chain_id) {
        Some(chain) => chain,
        None => {
            eprintln!("Unsupported chain id: {}", chain_id);
            exit(1);
        }
    };

    let provider = ProviderBuilder::new().connect_client(RpcClient::new_http(node_url));
    let registry = Arc::new(TokenRegistry::mainnet());

    let (mut events, handle) = match fill::start(
        &chain,
        provider,
        registry,
        watch_config,
        tokio::time::sleep,
    )
    .await
    {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Failed to start watch: {}", e);
            exit(1);
        }
    };

    while let Some(event) = events.recv().await {
        match event {
            WatchEvent::Fetching { count, done } => {
                if done {
                    info!(trades = count, "initial backfill complete");
                } else {
                    debug!(trades = count, "backfilling");
                }
            }
            WatchEvent::Trade { index, trade } => {
                info!(
                    index,
                    txid = %trade.txid,
                    maker_volume = %trade.maker_volume,
                    taker_volume = %trade.taker_volume,
                    relay = %trade.relay_address,
                    "trade"
                );
            }
            WatchEvent::Statistics(stats) => {
                info!(
                    trades = stats.volume.total_trades,
                    fees = %stats.fees.total,
                    fiat_volume = %stats.volume.total_fiat,
                    pairs = stats.volume.tokens.len(),
                    "statistics"
                );
            }
        }
    }

    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(%e, "Watch terminated with an error");
            exit(1);
        }
        Err(e) => {
            error!(%e, "Watch task failed");
            exit(1);
        }
    }
}
