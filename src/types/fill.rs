use alloy::primitives::{Address, B256, TxHash, U256};

use crate::abi::dex::Exchange;

/// One raw fill event, as emitted by the exchange contract, along with its
/// transaction context. Amounts are raw smallest-unit integers.
#[derive(Clone, Debug)]
pub struct RawFill {
    pub tx_hash: TxHash,
    pub log_index: u64,
    pub block_number: u64,
    pub order_hash: B256,
    pub maker: Address,
    pub taker: Address,
    pub fee_recipient: Address,
    pub maker_token: Address,
    pub taker_token: Address,
    pub filled_maker_amount: U256,
    pub filled_taker_amount: U256,
    pub paid_maker_fee: U256,
    pub paid_taker_fee: U256,
}

impl RawFill {
    pub(crate) fn from_event(
        tx_hash: TxHash,
        log_index: u64,
        block_number: u64,
        event: Exchange::LogFill,
    ) -> Self {
        Self {
            tx_hash,
            log_index,
            block_number,
            order_hash: event.orderHash,
            maker: event.maker,
            taker: event.taker,
            fee_recipient: event.feeRecipient,
            maker_token: event.makerToken,
            taker_token: event.takerToken,
            filled_maker_amount: event.filledMakerTokenAmount,
            filled_taker_amount: event.filledTakerTokenAmount,
            paid_maker_fee: event.paidMakerFee,
            paid_taker_fee: event.paidTakerFee,
        }
    }
}
