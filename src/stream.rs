use std::time::Duration;

use alloy::{providers::Provider, rpc::types::Filter, sol_types::SolEvent};
use futures::{Stream, stream};

use crate::{Chain, abi::dex::Exchange, error::WatchError, types::RawFill};

/// Fill events from a single block.
#[derive(Clone, Debug)]
pub struct BlockFills {
    pub block_number: u64,
    pub block_timestamp: Option<u64>,
    pub fills: Vec<RawFill>,
}

/// Returns a stream of fill events emitted by the exchange contract,
/// batched per block, starting from the specified block.
///
/// Polls logs via the given [`Provider`] to produce a strictly continuous
/// block sequence, with [`Provider`]-configured interval.
///
/// It is recommended to setup the provider with
/// [`alloy::transports::layers::FallbackLayer`]
/// and/or [`alloy::transports::layers::RetryBackoffLayer`].
pub fn fills<P, S, SFut>(
    chain: &Chain,
    provider: P,
    from_block: u64,
    sleep: S,
) -> impl Stream<Item = Result<BlockFills, WatchError>>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let exchange = chain.exchange();
    stream::unfold(
        (provider, from_block),
        move |(provider, mut block_num)| async move {
            let filter = Filter::new()
                .address(exchange)
                .event_signature(Exchange::LogFill::SIGNATURE_HASH)
                .from_block(block_num)
                .to_block(block_num);
            loop {
                // Some RPC providers produce an empty response instead of an
                // error when the block in the filter does not exist yet, so
                // the head of the chain is checked alongside the logs.
                let result =
                    futures::try_join!(provider.get_block_number(), provider.get_logs(&filter))
                        .map_err(WatchError::from)
                        .and_then(|(head_block_num, logs)| {
                            if head_block_num < block_num {
                                return Err(WatchError::InvalidRequest(
                                    "block is not available yet".to_string(),
                                ));
                            }
                            let block_ts = logs.first().and_then(|l| l.block_timestamp);
                            let mut fills = Vec::with_capacity(logs.len());
                            for log in &logs {
                                fills.push(RawFill::from_event(
                                    log.transaction_hash.unwrap_or_default(),
                                    log.log_index.unwrap_or_default(),
                                    block_num,
                                    Exchange::LogFill::decode_log(&log.inner)
                                        .map_err(WatchError::from)?
                                        .data,
                                ));
                            }
                            Ok(BlockFills {
                                block_number: block_num,
                                block_timestamp: block_ts,
                                fills,
                            })
                        });
                if result.is_ok() {
                    block_num += 1;
                    return Some((result, (provider, block_num)));
                }
                if matches!(result, Err(WatchError::InvalidRequest(_))) {
                    // Block is not available yet
                    sleep(provider.client().poll_interval()).await;
                    continue;
                }
                return Some((result, (provider, block_num)));
            }
        },
    )
}
