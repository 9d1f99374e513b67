//! Exchange contract interface.
//!
//! Only the surface the watcher consumes: the fill event and the
//! filled-amount state query. Order call data is decoded by hand in
//! [`crate::decode`] instead of through generated bindings, since only one
//! fixed method layout is supported.

#[allow(clippy::too_many_arguments)]
pub mod dex {
    alloy::sol!(
        #[derive(Debug)]
        #[sol(rpc)]
        contract Exchange {
            /// Emitted for every (partial or full) order fill.
            event LogFill(
                address indexed maker,
                address taker,
                address indexed feeRecipient,
                address makerToken,
                address takerToken,
                uint256 filledMakerTokenAmount,
                uint256 filledTakerTokenAmount,
                uint256 paidMakerFee,
                uint256 paidTakerFee,
                bytes32 indexed tokens,
                bytes32 orderHash
            );

            /// Sum of the taker amounts already filled or cancelled for an order.
            function getUnavailableTakerTokenAmount(bytes32 orderHash)
                external
                view
                returns (uint256);
        }
    );
}
