//! Order reconstruction.
//!
//! Given a trade, fetches its transaction, decodes the fixed-layout fill
//! order from the call data, recomputes the canonical order hash and
//! cross-validates it against the hash recorded with the trade, then
//! queries the remaining fillable amount from exchange state.
//!
//! Decode failures (unsupported method, truncated call data, hash
//! mismatch) are scoped to the order and reported inline in the returned
//! [`OrderInfo`]; they never affect the ingestion pipeline.

use std::time::Duration;

use alloy::{
    consensus::Transaction as _,
    primitives::{Address, B256, U256},
    providers::Provider,
};
use tracing::{debug, error, warn};

use crate::{
    Chain,
    abi::dex::Exchange,
    decode::{DecodeError, FilledOrder},
    error::WatchError,
    num,
    registry::TokenRegistry,
    types::{OrderDetail, OrderInfo, OrderParty, OrderSignature, PortalOrder, TokenRef, Trade, TxInfo},
    unix_now,
};

const TRANSACTION_RETRY: Duration = Duration::from_secs(15);

/// Reconstructs the order behind a trade.
///
/// The transaction lookup retries indefinitely with a fixed delay, like
/// block-timestamp resolution. A hash mismatch is surfaced with diagnostic
/// context but not retried: it indicates a decoding-assumption fault, not a
/// transient one.
pub async fn fetch_order<P, S, SFut>(
    chain: &Chain,
    provider: &P,
    registry: &TokenRegistry,
    trade: &Trade,
    sleep: S,
) -> Result<OrderInfo, WatchError>
where
    P: Provider,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let transaction = fetch_transaction(provider, trade, sleep).await;

    let order = match FilledOrder::decode(&transaction.input) {
        Ok(order) => order,
        Err(error) => {
            return Ok(OrderInfo {
                transaction,
                outcome: Err(error),
            });
        }
    };

    let hash = order.order_hash(chain.exchange());
    if hash != trade.order_hash {
        error!(
            txid = %trade.txid,
            computed = %hash,
            recorded = %trade.order_hash,
            "order hash mismatch while decoding fill transaction"
        );
        return Ok(OrderInfo {
            transaction,
            outcome: Err(DecodeError::HashMismatch {
                computed: hash,
                recorded: trade.order_hash,
            }),
        });
    }

    let instance = Exchange::new(chain.exchange(), provider);
    let unavailable = instance
        .getUnavailableTakerTokenAmount(hash)
        .call()
        .await
        .map_err(WatchError::from)?;

    let detail = build_detail(chain, registry, order, hash, unavailable, unix_now());
    Ok(OrderInfo {
        transaction,
        outcome: Ok(detail),
    })
}

async fn fetch_transaction<P, S, SFut>(provider: &P, trade: &Trade, sleep: S) -> TxInfo
where
    P: Provider,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    loop {
        match provider.get_transaction_by_hash(trade.txid).await {
            Ok(Some(tx)) => {
                return TxInfo {
                    hash: trade.txid,
                    input: tx.input().clone(),
                    gas_limit: tx.gas_limit(),
                    gas_price: tx.gas_price(),
                };
            }
            Ok(None) => {
                debug!(txid = %trade.txid, "transaction not available yet, retrying");
            }
            Err(error) => {
                warn!(txid = %trade.txid, %error, "transaction lookup failed, retrying");
            }
        }
        sleep(TRANSACTION_RETRY).await;
    }
}

/// Assembles the display-oriented order from decoded fields and exchange
/// state. Pure; `now` decides expiry.
fn build_detail(
    chain: &Chain,
    registry: &TokenRegistry,
    order: FilledOrder,
    hash: B256,
    unavailable: U256,
    now: u64,
) -> OrderDetail {
    let token_ref = |address: Address| match registry.get(address) {
        Some(info) => TokenRef {
            address,
            symbol: Some(info.symbol),
            name: Some(info.name),
            decimals: Some(info.decimals),
        },
        None => TokenRef {
            address,
            symbol: None,
            name: None,
            decimals: None,
        },
    };

    let remaining_raw = order.taker_token_amount.saturating_sub(unavailable);
    let (taker_amount_remaining, taker_amount_remaining_normalized) =
        num::normalize_quantity(registry.decimals(order.taker_token), remaining_raw);

    let is_open_taker = order.taker == Address::ZERO;
    let is_expired = order.expiration < U256::from(now);

    OrderDetail {
        order: PortalOrder {
            maker: OrderParty {
                address: order.maker,
                token: token_ref(order.maker_token),
                amount: order.maker_token_amount,
                fee_amount: order.maker_fee,
            },
            taker: OrderParty {
                address: order.taker,
                token: token_ref(order.taker_token),
                amount: order.taker_token_amount,
                fee_amount: order.taker_fee,
            },
            expiration: order.expiration,
            fee_recipient: order.fee_recipient,
            salt: order.salt,
            exchange_contract: chain.exchange(),
            signature: OrderSignature {
                v: order.signature_v,
                r: order.signature_r,
                s: order.signature_s,
                hash,
            },
        },
        is_open_taker,
        is_expired,
        taker_amount_remaining,
        taker_amount_remaining_normalized,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use fastnum::udec256;

    use super::*;

    fn sample_order() -> FilledOrder {
        FilledOrder {
            maker: Address::with_last_byte(0x10),
            taker: Address::ZERO,
            // ZRX for USDC
            maker_token: address!("0xe41d2489571d322189246dafa5ebde1f4699f498"),
            taker_token: address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            fee_recipient: Address::with_last_byte(0x30),
            maker_token_amount: U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18)),
            taker_token_amount: U256::from(250_000_000u64),
            maker_fee: U256::ZERO,
            taker_fee: U256::ZERO,
            expiration: U256::from(1_700_000_000u64),
            salt: U256::from(7u64),
            signature_v: 27,
            signature_r: B256::with_last_byte(1),
            signature_s: B256::with_last_byte(2),
        }
    }

    #[test]
    fn test_build_detail_remaining_and_flags() {
        let chain = Chain::mainnet();
        let registry = TokenRegistry::mainnet();
        let order = sample_order();
        let hash = order.order_hash(chain.exchange());

        // 100 of the 250 USDC already unavailable, order not yet expired.
        let detail = build_detail(
            &chain,
            &registry,
            order,
            hash,
            U256::from(100_000_000u64),
            1_699_999_999,
        );

        assert!(detail.is_open_taker);
        assert!(!detail.is_expired);
        assert!(detail.taker_amount_remaining_normalized);
        assert_eq!(detail.taker_amount_remaining, udec256!(150));
        assert_eq!(detail.order.signature.hash, hash);
        assert_eq!(detail.order.maker.token.symbol.as_deref(), Some("ZRX"));
        assert_eq!(detail.order.taker.token.decimals, Some(6));
        assert_eq!(detail.order.exchange_contract, chain.exchange());
    }

    #[test]
    fn test_build_detail_expired_designated_taker() {
        let chain = Chain::mainnet();
        let registry = TokenRegistry::mainnet();
        let mut order = sample_order();
        order.taker = Address::with_last_byte(0x20);
        let hash = order.order_hash(chain.exchange());

        let detail = build_detail(&chain, &registry, order, hash, U256::ZERO, 1_700_000_001);

        assert!(!detail.is_open_taker);
        assert!(detail.is_expired);
        assert_eq!(detail.taker_amount_remaining, udec256!(250));
    }
}
