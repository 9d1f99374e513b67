use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use fastnum::UD256;

use crate::decode::DecodeError;

/// Token reference enriched with registry metadata, when known.
#[derive(Clone, Debug)]
pub struct TokenRef {
    pub address: Address,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
}

/// One side (maker or taker) of a reconstructed order.
#[derive(Clone, Debug)]
pub struct OrderParty {
    pub address: Address,
    pub token: TokenRef,
    /// Raw smallest-unit token amount of this side of the order.
    pub amount: U256,
    /// Raw smallest-unit fee amount, in fee-token units.
    pub fee_amount: U256,
}

/// ECDSA signature of the order, along with the canonical order hash it
/// was recomputed against.
#[derive(Clone, Debug)]
pub struct OrderSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub hash: B256,
}

/// Display-oriented representation of a reconstructed order.
#[derive(Clone, Debug)]
pub struct PortalOrder {
    pub maker: OrderParty,
    pub taker: OrderParty,
    pub expiration: U256,
    pub fee_recipient: Address,
    pub salt: U256,
    pub exchange_contract: Address,
    pub signature: OrderSignature,
}

/// Subset of the fill transaction kept for display (gas costs).
#[derive(Clone, Debug)]
pub struct TxInfo {
    pub hash: TxHash,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_price: Option<u128>,
}

/// Successfully decoded and cross-checked order, with its live fill state.
#[derive(Clone, derive_more::Debug)]
pub struct OrderDetail {
    pub order: PortalOrder,

    /// True when the order was posted without a designated taker.
    pub is_open_taker: bool,

    /// True when the order's expiration lies in the past.
    pub is_expired: bool,

    /// Taker amount still fillable.
    #[debug("{taker_amount_remaining}")]
    pub taker_amount_remaining: UD256,

    /// Whether `taker_amount_remaining` could be normalized to decimal
    /// token units.
    pub taker_amount_remaining_normalized: bool,
}

/// Outcome of reconstructing the order behind a trade.
///
/// Decode failures stay scoped to the order: the transaction is retained
/// either way so callers can still render gas information.
#[derive(Clone, Debug)]
pub struct OrderInfo {
    pub transaction: TxInfo,
    pub outcome: Result<OrderDetail, DecodeError>,
}
