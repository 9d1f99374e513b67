use alloy::primitives::{Address, B256, TxHash};
use fastnum::UD256;

/// One normalized fill.
///
/// Constructed once by the ingestion pipeline from exactly one raw fill
/// event and never mutated afterwards; the ledger retains trades in
/// timestamp order and consumers receive clones.
#[derive(Clone, derive_more::Debug)]
pub struct Trade {
    /// Transaction the fill occurred in.
    pub txid: TxHash,

    /// Hash of the filled order. `(txid, order_hash)` identifies the fill.
    pub order_hash: B256,

    /// Block the fill occurred in.
    pub block_number: u64,

    /// Block timestamp, attached after normalization from block lookup.
    pub timestamp: u64,

    pub maker_address: Address,
    pub taker_address: Address,

    /// Fee recipient of the order.
    pub relay_address: Address,

    pub maker_token: Address,
    pub taker_token: Address,

    /// Maker-side volume. Decimal token units when `maker_normalized`,
    /// otherwise the raw smallest-unit integer value.
    #[debug("{maker_volume}")]
    pub maker_volume: UD256,

    /// Taker-side volume, scaled like `maker_volume`.
    #[debug("{taker_volume}")]
    pub taker_volume: UD256,

    /// Maker fee in fee-token units.
    #[debug("{maker_fee}")]
    pub maker_fee: UD256,

    /// Taker fee in fee-token units.
    #[debug("{taker_fee}")]
    pub taker_fee: UD256,

    /// True iff the maker token's decimal count was known at normalization.
    pub maker_normalized: bool,

    /// True iff the taker token's decimal count was known at normalization.
    pub taker_normalized: bool,

    /// Maker-per-taker unit price, when computable.
    #[debug("{:?}", mt_price.map(|v| format!("{v}")))]
    pub mt_price: Option<UD256>,

    /// Taker-per-maker unit price, when computable.
    #[debug("{:?}", tm_price.map(|v| format!("{v}")))]
    pub tm_price: Option<UD256>,
}

impl Trade {
    /// Combined maker and taker fee, in fee-token units.
    pub fn relay_fee(&self) -> UD256 {
        self.maker_fee + self.taker_fee
    }
}
