//! Exchange trade watcher.
//!
//! # Overview
//!
//! Ingests a DEX's on-chain fill events, reconstructs normalized [`types::Trade`]
//! records, and maintains a rolling time-windowed view of trading activity:
//! an ordered trade ledger, per-pair price/volume time series, and aggregate
//! [`market::Statistics`].
//!
//! Use [`fill::start`] to launch the watch: it backfills enough history to
//! cover the statistics window, then follows the chain tip and the fiat
//! price feed, emitting [`fill::WatchEvent`]s through the returned receiver.
//!
//! Use [`order::fetch_order`] to reconstruct the human-readable order behind
//! a trade from its transaction call data, cross-checked against the
//! on-chain order hash.
//!
//! # Limitations/follow-ups
//!
//! * Only the v1 `fillOrder` call-data layout is decoded; fills submitted
//!   through other entry points are reported as unsupported.
//! * Backfill walks backward in fixed block strides; arbitrary historical
//!   range queries are not supported.
//! * The trade ledger grows with history. Only the trailing statistics
//!   window is ever aggregated, but older trades stay queryable.

pub mod abi;
pub mod backfill;
pub mod blocks;
pub mod decode;
pub mod error;
pub mod fill;
pub mod market;
pub mod num;
pub mod order;
pub mod price;
pub mod registry;
pub mod stream;
pub mod types;

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, address};

/// Chain the exchange is operating on.
#[derive(Clone, Debug)]
pub struct Chain {
    chain_id: u64,
    exchange: Address,
    fee_token: Address,
    deployed_at_block: u64,
}

impl Chain {
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            exchange: address!("0x12459c951127e0c374ff9105dda097662a027093"),
            fee_token: address!("0xe41d2489571d322189246dafa5ebde1f4699f498"),
            deployed_at_block: 4145578,
        }
    }

    pub fn kovan() -> Self {
        Self {
            chain_id: 42,
            exchange: address!("0x90fe2af704b34e0224bf2299c838e04d4dcf1364"),
            fee_token: address!("0x6ff6c0ff1d68b964901f986d4c9fa3ac68346570"),
            deployed_at_block: 4145578,
        }
    }

    pub fn custom(
        chain_id: u64,
        exchange: Address,
        fee_token: Address,
        deployed_at_block: u64,
    ) -> Self {
        Self {
            chain_id,
            exchange,
            fee_token,
            deployed_at_block,
        }
    }

    /// Chain configuration for a known chain ID, if supported.
    pub fn known(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Self::mainnet()),
            42 => Some(Self::kovan()),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Exchange contract emitting fill events.
    pub fn exchange(&self) -> Address {
        self.exchange
    }

    /// Token all exchange fees are denominated in.
    pub fn fee_token(&self) -> Address {
        self.fee_token
    }

    /// Block the exchange contract was deployed at. Lower bound for backfill.
    pub fn deployed_at_block(&self) -> u64 {
        self.deployed_at_block
    }
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
