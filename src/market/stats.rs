use std::collections::HashMap;

use alloy::primitives::Address;
use fastnum::UD256;

use super::TradeLedger;
use crate::{price::PriceTable, registry::TokenRegistry};

/// Fee aggregates over the statistics window, in fee-token units.
#[derive(Clone, Debug)]
pub struct FeeStatistics {
    /// Sum of maker and taker fees across all trades.
    pub total: UD256,

    /// Fee totals keyed by relay (fee recipient) address.
    pub relays: HashMap<Address, UD256>,

    /// Number of trades that paid a nonzero relay fee.
    pub fee_count: u64,

    /// Number of trades that paid no relay fee.
    pub feeless_count: u64,

    /// `total` converted to fiat, when the fee token's price is known.
    pub total_fiat: Option<UD256>,

    /// Current fiat price of the fee token, when known.
    pub fee_token_price: Option<UD256>,
}

/// Per-token volume aggregates.
#[derive(Clone, Debug)]
pub struct TokenVolume {
    /// Cumulative volume in the token's own units (decimal when the token
    /// normalizes, raw otherwise).
    pub volume: UD256,

    /// Cumulative fiat volume; only normalized trades of tokens with a
    /// known fiat price contribute.
    pub volume_fiat: UD256,

    /// Number of trades the token took part in.
    pub count: u64,
}

/// Volume aggregates over the statistics window.
#[derive(Clone, Debug)]
pub struct VolumeStatistics {
    pub total_trades: u64,

    /// Aggregate fiat volume across all tokens.
    pub total_fiat: UD256,

    /// Per-token aggregates, credited to maker-side and taker-side tokens
    /// independently.
    pub tokens: HashMap<Address, TokenVolume>,
}

/// Trade counts over the statistics window.
#[derive(Clone, Debug)]
pub struct CountStatistics {
    /// Trades keyed by relay address.
    pub relays: HashMap<Address, u64>,
}

/// Aggregate statistics over the trailing window.
///
/// A derived, ephemeral snapshot: fully recomputed on every trigger and
/// superseded wholesale by the next one, never patched incrementally.
#[derive(Clone, Debug)]
pub struct Statistics {
    pub fees: FeeStatistics,
    pub volume: VolumeStatistics,
    pub counts: CountStatistics,
}

impl Default for FeeStatistics {
    fn default() -> Self {
        Self {
            total: UD256::ZERO,
            relays: HashMap::new(),
            fee_count: 0,
            feeless_count: 0,
            total_fiat: None,
            fee_token_price: None,
        }
    }
}

impl Default for TokenVolume {
    fn default() -> Self {
        Self {
            volume: UD256::ZERO,
            volume_fiat: UD256::ZERO,
            count: 0,
        }
    }
}

impl Default for VolumeStatistics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            total_fiat: UD256::ZERO,
            tokens: HashMap::new(),
        }
    }
}

impl Default for CountStatistics {
    fn default() -> Self {
        Self {
            relays: HashMap::new(),
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            fees: FeeStatistics::default(),
            volume: VolumeStatistics::default(),
            counts: CountStatistics::default(),
        }
    }
}

impl Statistics {
    /// Reduces the ledger's time-windowed prefix into a fresh snapshot.
    ///
    /// Walks the ledger newest to oldest and stops at the first trade older
    /// than `now - window`; the ledger's descending-timestamp order makes
    /// that a valid early-exit boundary.
    pub fn compute(
        ledger: &TradeLedger,
        registry: &TokenRegistry,
        prices: &PriceTable,
        fee_token: Address,
        now: u64,
        window: u64,
    ) -> Self {
        let cutoff = now.saturating_sub(window);
        let mut stats = Self::default();

        for trade in ledger.trades() {
            if trade.timestamp < cutoff {
                break;
            }

            let relay_fee = trade.relay_fee();
            *stats
                .fees
                .relays
                .entry(trade.relay_address)
                .or_insert(UD256::ZERO) += relay_fee;
            stats.fees.total += relay_fee;
            if relay_fee != UD256::ZERO {
                stats.fees.fee_count += 1;
            } else {
                stats.fees.feeless_count += 1;
            }

            *stats.counts.relays.entry(trade.relay_address).or_insert(0) += 1;

            let sides = [
                (trade.maker_token, trade.maker_volume, trade.maker_normalized),
                (trade.taker_token, trade.taker_volume, trade.taker_normalized),
            ];
            for (token, volume, normalized) in sides {
                let entry = stats.volume.tokens.entry(token).or_default();
                entry.volume += volume;
                entry.count += 1;
                if normalized {
                    if let Some(price) = registry.symbol(token).and_then(|sym| prices.get(&sym)) {
                        let fiat = volume * price;
                        entry.volume_fiat += fiat;
                        stats.volume.total_fiat += fiat;
                    }
                }
            }
            stats.volume.total_trades += 1;
        }

        if let Some(price) = registry.symbol(fee_token).and_then(|sym| prices.get(&sym)) {
            stats.fees.total_fiat = Some(stats.fees.total * price);
            stats.fees.fee_token_price = Some(price);
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{B256, TxHash, address};
    use fastnum::udec256;

    use super::*;
    use crate::types::Trade;

    const WINDOW: u64 = 86_400;
    const NOW: u64 = 1_700_000_000;

    fn fee_token() -> Address {
        address!("0xe41d2489571d322189246dafa5ebde1f4699f498")
    }

    fn weth() -> Address {
        address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")
    }

    fn trade(timestamp: u64, tag: u8, fee: UD256) -> Trade {
        Trade {
            txid: TxHash::with_last_byte(tag),
            order_hash: B256::with_last_byte(tag),
            block_number: 0,
            timestamp,
            maker_address: Address::with_last_byte(0x10),
            taker_address: Address::with_last_byte(0x20),
            relay_address: Address::with_last_byte(0x30),
            maker_token: weth(),
            taker_token: fee_token(),
            maker_volume: udec256!(2),
            taker_volume: udec256!(500),
            maker_fee: fee,
            taker_fee: UD256::ZERO,
            maker_normalized: true,
            taker_normalized: true,
            mt_price: Some(udec256!(0.004)),
            tm_price: Some(udec256!(250)),
        }
    }

    #[test]
    fn test_window_boundary() {
        let mut ledger = TradeLedger::new();
        ledger.insert(trade(NOW - 90_000, 1, udec256!(1)));
        ledger.insert(trade(NOW - 86_399, 2, udec256!(1)));
        ledger.insert(trade(NOW - 10, 3, udec256!(1)));

        let stats = Statistics::compute(
            &ledger,
            &TokenRegistry::mainnet(),
            &PriceTable::new(),
            fee_token(),
            NOW,
            WINDOW,
        );

        assert_eq!(stats.volume.total_trades, 2);
        assert_eq!(stats.fees.total, udec256!(2));
        assert_eq!(
            stats.counts.relays.get(&Address::with_last_byte(0x30)),
            Some(&2)
        );
    }

    #[test]
    fn test_fee_vs_feeless_counts() {
        let mut ledger = TradeLedger::new();
        ledger.insert(trade(NOW - 100, 1, udec256!(3)));
        ledger.insert(trade(NOW - 200, 2, UD256::ZERO));
        ledger.insert(trade(NOW - 300, 3, udec256!(2)));

        let stats = Statistics::compute(
            &ledger,
            &TokenRegistry::mainnet(),
            &PriceTable::new(),
            fee_token(),
            NOW,
            WINDOW,
        );

        assert_eq!(stats.fees.fee_count, 2);
        assert_eq!(stats.fees.feeless_count, 1);
        assert_eq!(stats.fees.total, udec256!(5));
        assert_eq!(
            stats.fees.relays.get(&Address::with_last_byte(0x30)),
            Some(&udec256!(5))
        );
        assert_eq!(stats.fees.total_fiat, None);
    }

    #[test]
    fn test_fiat_conversion() {
        let mut ledger = TradeLedger::new();
        ledger.insert(trade(NOW - 100, 1, udec256!(10)));

        let mut prices = PriceTable::new();
        prices.set("WETH", udec256!(2000));
        prices.set("ZRX", udec256!(0.5));

        let registry = TokenRegistry::mainnet();
        let stats = Statistics::compute(&ledger, &registry, &prices, fee_token(), NOW, WINDOW);

        // Maker side: 2 WETH * 2000, taker side: 500 ZRX * 0.5.
        assert_eq!(stats.volume.total_fiat, udec256!(4250));
        assert_eq!(
            stats.volume.tokens.get(&weth()).unwrap().volume_fiat,
            udec256!(4000)
        );
        assert_eq!(
            stats.volume.tokens.get(&fee_token()).unwrap().volume_fiat,
            udec256!(250)
        );
        assert_eq!(stats.volume.tokens.get(&weth()).unwrap().count, 1);

        assert_eq!(stats.fees.total_fiat, Some(udec256!(5)));
        assert_eq!(stats.fees.fee_token_price, Some(udec256!(0.5)));
    }
}
