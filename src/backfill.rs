use alloy::{primitives::Address, providers::Provider, rpc::types::Filter, sol_types::SolEvent};
use tracing::debug;

use crate::{Chain, abi::dex::Exchange, error::WatchError, types::RawFill};

/// Walks backward through historical fill events in fixed block strides.
///
/// Each batch covers a contiguous block range ending at the oldest block
/// fetched so far (the chain head on the first call), clamped at the lower
/// end to the exchange deployment block. One block of overlap between
/// consecutive batches is harmless: re-delivered fills are dropped by the
/// ingestion dedup.
#[derive(Debug)]
pub struct Backfiller<P> {
    provider: P,
    exchange: Address,
    genesis_block: u64,
    head: u64,
    batch_blocks: u64,
    oldest_block: Option<u64>,
}

impl<P> Backfiller<P> {
    pub fn new(chain: &Chain, provider: P, head: u64, batch_blocks: u64) -> Self {
        Self {
            provider,
            exchange: chain.exchange(),
            genesis_block: chain.deployed_at_block(),
            head,
            batch_blocks,
            oldest_block: None,
        }
    }

    /// Oldest block fetched so far; `None` before the first batch.
    pub fn oldest_block(&self) -> Option<u64> {
        self.oldest_block
    }

    /// True once the walk has been clamped to the exchange deployment
    /// block. No further batch can extend coverage; treat as the terminal
    /// condition when the window is still not met.
    pub fn at_genesis(&self) -> bool {
        self.oldest_block == Some(self.genesis_block)
    }

    fn batch_range(&self) -> (u64, u64) {
        let to = self.oldest_block.unwrap_or(self.head);
        let from = to.saturating_sub(self.batch_blocks).max(self.genesis_block);
        (from, to)
    }
}

impl<P: Provider> Backfiller<P> {
    /// Fetches the next batch of historical fills, in emission order, and
    /// advances the oldest-block cursor. The cursor only moves on success,
    /// so a failed batch can simply be retried.
    pub async fn next_batch(&mut self) -> Result<Vec<RawFill>, WatchError> {
        let (from, to) = self.batch_range();
        debug!(from, to, "fetching past fill logs");

        let filter = Filter::new()
            .address(self.exchange)
            .event_signature(Exchange::LogFill::SIGNATURE_HASH)
            .from_block(from)
            .to_block(to);
        let logs = self.provider.get_logs(&filter).await.map_err(WatchError::from)?;

        let mut fills = Vec::with_capacity(logs.len());
        for log in &logs {
            fills.push(RawFill::from_event(
                log.transaction_hash.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                log.block_number.unwrap_or_default(),
                Exchange::LogFill::decode_log(&log.inner)
                    .map_err(WatchError::from)?
                    .data,
            ));
        }

        self.oldest_block = Some(from);
        Ok(fills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backfiller(head: u64, batch_blocks: u64) -> Backfiller<()> {
        Backfiller::new(&Chain::mainnet(), (), head, batch_blocks)
    }

    #[test]
    fn test_batch_range_walks_backward() {
        let mut backfiller = backfiller(5_000_000, 5_000);

        assert_eq!(backfiller.batch_range(), (4_995_000, 5_000_000));
        backfiller.oldest_block = Some(4_995_000);

        assert_eq!(backfiller.batch_range(), (4_990_000, 4_995_000));
        assert!(!backfiller.at_genesis());
    }

    #[test]
    fn test_batch_range_clamps_to_genesis() {
        let genesis = Chain::mainnet().deployed_at_block();
        let mut backfiller = backfiller(genesis + 3_000, 5_000);

        assert_eq!(backfiller.batch_range(), (genesis, genesis + 3_000));
        backfiller.oldest_block = Some(genesis);

        assert!(backfiller.at_genesis());
        // Clamped range never walks below deployment.
        assert_eq!(backfiller.batch_range(), (genesis, genesis));
    }
}
