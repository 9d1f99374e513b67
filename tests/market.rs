//! Tests ingesting raw fill events through the market engine the way the
//! listener drives it: prepare, resolve a timestamp, commit.

use std::sync::Arc;

use alloy::primitives::{Address, B256, TxHash, U256, address};
use fastnum::udec256;
use trade_watch::{
    Chain,
    market::Market,
    price::PriceTable,
    registry::TokenRegistry,
    types::RawFill,
};

const NOW: u64 = 1_700_000_000;
const WINDOW: u64 = 86_400;

fn weth() -> Address {
    address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")
}

fn usdc() -> Address {
    address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
}

fn market() -> Market {
    Market::new(&Chain::mainnet(), Arc::new(TokenRegistry::mainnet()), WINDOW)
}

/// A fill of 1 WETH (18 decimals) against 5 USDC (6 decimals).
fn weth_usdc_fill(tag: u8) -> RawFill {
    RawFill {
        tx_hash: TxHash::with_last_byte(tag),
        log_index: 0,
        block_number: 4_200_000,
        order_hash: B256::with_last_byte(tag),
        maker: Address::with_last_byte(0x10),
        taker: Address::with_last_byte(0x20),
        fee_recipient: Address::with_last_byte(0x30),
        maker_token: weth(),
        taker_token: usdc(),
        filled_maker_amount: U256::from(10u64).pow(U256::from(18)),
        filled_taker_amount: U256::from(5_000_000u64),
        paid_maker_fee: U256::ZERO,
        paid_taker_fee: U256::ZERO,
    }
}

fn ingest(market: &mut Market, fill: &RawFill, timestamp: u64) -> Option<usize> {
    let pending = market.prepare(fill)?;
    let (index, _) = market.commit(pending, timestamp);
    Some(index)
}

#[test]
fn test_end_to_end_normalization() {
    let mut market = market();
    ingest(&mut market, &weth_usdc_fill(1), NOW).unwrap();

    let trade = &market.ledger().trades()[0];
    assert_eq!(trade.maker_volume, udec256!(1));
    assert_eq!(trade.taker_volume, udec256!(5));
    assert_eq!(trade.mt_price, Some(udec256!(0.2)));
    assert_eq!(trade.tm_price, Some(udec256!(5)));
    assert_eq!(trade.mt_price.unwrap() * trade.tm_price.unwrap(), udec256!(1));
}

#[test]
fn test_duplicate_delivery_yields_one_trade() {
    let mut market = market();

    // Same fill arriving via subscription and backfill.
    assert!(ingest(&mut market, &weth_usdc_fill(1), NOW).is_some());
    assert!(ingest(&mut market, &weth_usdc_fill(1), NOW).is_none());
    assert_eq!(market.ledger().len(), 1);

    // Concurrent re-delivery between prepare and commit is also dropped.
    let pending = market.prepare(&weth_usdc_fill(2)).unwrap();
    assert!(market.prepare(&weth_usdc_fill(2)).is_none());
    market.commit(pending, NOW);
    assert_eq!(market.ledger().len(), 2);
}

#[test]
fn test_arrival_order_does_not_affect_ledger_order() {
    let mut market = market();
    let arrivals = [(1u8, NOW - 50), (2, NOW - 10), (3, NOW - 300), (4, NOW - 10)];
    for (tag, timestamp) in arrivals {
        assert!(ingest(&mut market, &weth_usdc_fill(tag), timestamp).is_some());
    }

    let timestamps: Vec<u64> = market.ledger().trades().iter().map(|t| t.timestamp).collect();
    let mut sorted = timestamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(timestamps, sorted);

    // A trade older than everything else lands at the back.
    assert_eq!(
        ingest(&mut market, &weth_usdc_fill(5), NOW - 1_000),
        Some(4)
    );
}

#[test]
fn test_statistics_window_and_gating() {
    let mut market = market();
    for (tag, timestamp) in [(1u8, NOW - 90_000), (2, NOW - 86_399), (3, NOW - 60)] {
        assert!(ingest(&mut market, &weth_usdc_fill(tag), timestamp).is_some());
    }

    // Suppressed until the initial backfill completes.
    assert!(market.statistics(NOW).is_none());

    market.finish_initial_fetch();
    let stats = market.statistics(NOW).unwrap();
    assert_eq!(stats.volume.total_trades, 2);
    assert_eq!(stats.fees.feeless_count, 2);
    assert_eq!(stats.volume.tokens.get(&weth()).unwrap().volume, udec256!(2));
}

#[test]
fn test_price_update_flows_into_statistics() {
    let mut market = market();
    assert!(ingest(&mut market, &weth_usdc_fill(1), NOW - 60).is_some());
    market.finish_initial_fetch();

    let mut update = PriceTable::new();
    update.set("WETH", udec256!(2000));
    update.set("USDC", udec256!(1));
    market.apply_prices(update);

    let stats = market.statistics(NOW).unwrap();
    // 1 WETH * 2000 + 5 USDC * 1
    assert_eq!(stats.volume.total_fiat, udec256!(2005));
}

#[test]
fn test_history_tracks_and_prunes_with_statistics() {
    let mut market = market();
    for (tag, timestamp) in [(1u8, NOW - 200_000), (2, NOW - 60)] {
        assert!(ingest(&mut market, &weth_usdc_fill(tag), timestamp).is_some());
    }
    market.finish_initial_fetch();

    assert_eq!(market.history().price_data("USDC/WETH").len(), 2);

    // Statistics recomputation prunes the out-of-window sample.
    market.statistics(NOW).unwrap();
    let series = market.history().price_data("USDC/WETH");
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].timestamp, NOW - 60);

    let mirror = market.history().price_data("WETH/USDC");
    assert_eq!(mirror.len(), 1);
    assert_eq!(series[0].value * mirror[0].value, udec256!(1));
}
