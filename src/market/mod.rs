//! Market state tracking.
//!
//! [`Market`] is the pure, synchronous core of the watch: it deduplicates
//! and normalizes raw fill events into [`Trade`] records, maintains the
//! timestamp-ordered [`TradeLedger`] and the bidirectional
//! [`PriceVolumeHistory`], applies fiat price updates, and derives
//! [`Statistics`] snapshots over the trailing window.
//!
//! All async I/O (block timestamps, log queries, price fetches) lives at the
//! edges in [`crate::fill`], [`crate::backfill`] and [`crate::price`]; every
//! mutation here runs to completion on the single ingestion task, so no
//! locking is involved.

mod history;
mod ledger;
mod stats;

use std::{collections::HashSet, sync::Arc};

use alloy::primitives::{Address, B256, TxHash};
use fastnum::{UD256, udec256};

pub use history::{PriceVolumeHistory, Sample};
pub use ledger::TradeLedger;
pub use stats::{CountStatistics, FeeStatistics, Statistics, TokenVolume, VolumeStatistics};

use crate::{
    Chain, num,
    price::PriceTable,
    registry::TokenRegistry,
    types::{RawFill, Trade},
};

/// A normalized fill awaiting its block timestamp.
///
/// Produced by [`Market::prepare`]; the fill is already marked as seen, so
/// a concurrent re-delivery of the same event (live subscription racing the
/// backfill) is dropped while the timestamp lookup is in flight.
#[derive(Clone, Debug)]
pub struct PendingTrade {
    txid: TxHash,
    order_hash: B256,
    block_number: u64,
    maker_address: Address,
    taker_address: Address,
    relay_address: Address,
    maker_token: Address,
    taker_token: Address,
    maker_volume: UD256,
    taker_volume: UD256,
    maker_fee: UD256,
    taker_fee: UD256,
    maker_normalized: bool,
    taker_normalized: bool,
    mt_price: Option<UD256>,
    tm_price: Option<UD256>,
}

impl PendingTrade {
    pub fn block_number(&self) -> u64 {
        self.block_number
    }
}

/// In-memory market state derived from the fill event feed.
#[derive(Clone, Debug)]
pub struct Market {
    chain: Chain,
    registry: Arc<TokenRegistry>,
    window: u64,
    ledger: TradeLedger,
    history: PriceVolumeHistory,
    prices: PriceTable,
    seen: HashSet<(TxHash, B256)>,
    initial_fetch_done: bool,
}

impl Market {
    pub fn new(chain: &Chain, registry: Arc<TokenRegistry>, window: u64) -> Self {
        Self {
            chain: chain.clone(),
            registry,
            window,
            ledger: TradeLedger::new(),
            history: PriceVolumeHistory::new(),
            prices: PriceTable::new(),
            seen: HashSet::new(),
            initial_fetch_done: false,
        }
    }

    /// Deduplicates and normalizes one raw fill.
    ///
    /// Returns `None` for fills already seen (same transaction and order
    /// hash), with no side effects. Otherwise normalizes volumes and fees,
    /// applies the price computation policy, marks the fill seen and returns
    /// the pending trade to be committed once its block timestamp resolves.
    pub fn prepare(&mut self, fill: &RawFill) -> Option<PendingTrade> {
        let key = (fill.tx_hash, fill.order_hash);
        if self.seen.contains(&key) {
            return None;
        }

        let (maker_volume, maker_normalized) = num::normalize_quantity(
            self.registry.decimals(fill.maker_token),
            fill.filled_maker_amount,
        );
        let (taker_volume, taker_normalized) = num::normalize_quantity(
            self.registry.decimals(fill.taker_token),
            fill.filled_taker_amount,
        );

        let fee_decimals = self.registry.decimals(self.chain.fee_token());
        let (maker_fee, _) = num::normalize_quantity(fee_decimals, fill.paid_maker_fee);
        let (taker_fee, _) = num::normalize_quantity(fee_decimals, fill.paid_taker_fee);

        let (mt_price, tm_price) = if maker_normalized
            && taker_normalized
            && !fill.filled_maker_amount.is_zero()
            && !fill.filled_taker_amount.is_zero()
        {
            (
                Some(maker_volume / taker_volume),
                Some(taker_volume / maker_volume),
            )
        } else if fill.filled_maker_amount == fill.filled_taker_amount {
            // Equal raw quantities price at exactly 1 with no decimal
            // knowledge required.
            (Some(udec256!(1)), Some(udec256!(1)))
        } else {
            (None, None)
        };

        self.seen.insert(key);

        Some(PendingTrade {
            txid: fill.tx_hash,
            order_hash: fill.order_hash,
            block_number: fill.block_number,
            maker_address: fill.maker,
            taker_address: fill.taker,
            relay_address: fill.fee_recipient,
            maker_token: fill.maker_token,
            taker_token: fill.taker_token,
            maker_volume,
            taker_volume,
            maker_fee,
            taker_fee,
            maker_normalized,
            taker_normalized,
            mt_price,
            tm_price,
        })
    }

    /// Attaches the resolved block timestamp, inserts the trade into the
    /// ledger, and records the price/volume observation for fully
    /// normalized pairs. Returns the ledger insertion index and the trade.
    pub fn commit(&mut self, pending: PendingTrade, timestamp: u64) -> (usize, Trade) {
        let trade = Trade {
            txid: pending.txid,
            order_hash: pending.order_hash,
            block_number: pending.block_number,
            timestamp,
            maker_address: pending.maker_address,
            taker_address: pending.taker_address,
            relay_address: pending.relay_address,
            maker_token: pending.maker_token,
            taker_token: pending.taker_token,
            maker_volume: pending.maker_volume,
            taker_volume: pending.taker_volume,
            maker_fee: pending.maker_fee,
            taker_fee: pending.taker_fee,
            maker_normalized: pending.maker_normalized,
            taker_normalized: pending.taker_normalized,
            mt_price: pending.mt_price,
            tm_price: pending.tm_price,
        };

        let index = self.ledger.insert(trade.clone());

        if trade.maker_normalized && trade.taker_normalized {
            if let (Some(mt_price), Some(tm_price)) = (trade.mt_price, trade.tm_price) {
                let symbols = (
                    self.registry.symbol(trade.maker_token),
                    self.registry.symbol(trade.taker_token),
                );
                if let (Some(maker_symbol), Some(taker_symbol)) = symbols {
                    self.history.insert(
                        &maker_symbol,
                        &taker_symbol,
                        timestamp,
                        mt_price,
                        tm_price,
                        trade.maker_volume,
                        trade.taker_volume,
                    );
                }
            }
        }

        (index, trade)
    }

    /// Applies a fiat price update to the price table.
    pub fn apply_prices(&mut self, update: PriceTable) {
        self.prices.merge(update);
    }

    /// Marks the initial backfill as complete, unblocking statistics.
    pub fn finish_initial_fetch(&mut self) {
        self.initial_fetch_done = true;
    }

    pub fn initial_fetch_done(&self) -> bool {
        self.initial_fetch_done
    }

    /// Recomputes the statistics snapshot at `now`, pruning the price/volume
    /// history to the window as a side effect.
    ///
    /// Returns `None` until the initial backfill has completed, so
    /// partial-window statistics are never presented as complete.
    pub fn statistics(&mut self, now: u64) -> Option<Statistics> {
        if !self.initial_fetch_done {
            return None;
        }

        self.history.prune(now.saturating_sub(self.window));

        Some(Statistics::compute(
            &self.ledger,
            &self.registry,
            &self.prices,
            self.chain.fee_token(),
            now,
            self.window,
        ))
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn history(&self) -> &PriceVolumeHistory {
        &self.history
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }
}
