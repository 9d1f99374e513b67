use std::{collections::HashMap, time::Duration};

use alloy::{eips::BlockId, providers::Provider};
use tracing::{debug, warn};

/// Cached block-number to timestamp lookup.
///
/// A block requested right after its fill event was observed may not be
/// served by the provider yet; absence is transient by definition, so the
/// lookup retries with a fixed delay until the block materializes. Results
/// are cached since backfill batches and live fills revisit the same blocks.
#[derive(Debug)]
pub struct BlockTimestamps<P> {
    provider: P,
    cache: HashMap<u64, u64>,
    retry: Duration,
}

impl<P: Provider> BlockTimestamps<P> {
    pub fn new(provider: P, retry: Duration) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
            retry,
        }
    }

    /// Records a timestamp observed out-of-band (e.g. from a log response).
    pub fn record(&mut self, block_number: u64, timestamp: u64) {
        self.cache.insert(block_number, timestamp);
    }

    /// Resolves the timestamp of a block, retrying indefinitely until the
    /// block is available.
    pub async fn get<S, SFut>(&mut self, block_number: u64, sleep: S) -> u64
    where
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        if let Some(timestamp) = self.cache.get(&block_number) {
            return *timestamp;
        }

        loop {
            match self.provider.get_block(BlockId::number(block_number)).await {
                Ok(Some(block)) => {
                    let timestamp = block.into_header().timestamp;
                    self.cache.insert(block_number, timestamp);
                    return timestamp;
                }
                Ok(None) => {
                    debug!(block_number, "block not available yet, retrying");
                }
                Err(error) => {
                    warn!(block_number, %error, "block lookup failed, retrying");
                }
            }
            sleep(self.retry).await;
        }
    }
}
