use tokio::sync::mpsc;

use crate::{market::Statistics, price::PriceTable, stream::BlockFills, types::Trade};

/// Event emitted by the watch to its consumer.
#[derive(Clone, Debug)]
pub enum WatchEvent {
    /// A new trade was ingested and inserted into the ledger at `index`
    /// (timestamp-descending position).
    Trade { index: usize, trade: Trade },

    /// Initial backfill progress: `count` trades ingested so far, `done`
    /// once the statistics window is covered.
    Fetching { count: usize, done: bool },

    /// A freshly recomputed statistics snapshot, superseding any previous
    /// one wholesale.
    Statistics(Box<Statistics>),
}

/// Receiver for watch events.
pub struct EventReceiver {
    inner: mpsc::Receiver<WatchEvent>,
}

impl EventReceiver {
    pub(crate) fn new(inner: mpsc::Receiver<WatchEvent>) -> Self {
        Self { inner }
    }

    /// Receives the next event, or `None` if the watch shut down.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.inner.recv().await
    }
}

/// Inbound message consumed by the single ingestion loop. Producers (live
/// subscription, price poller) only ever touch market state through this
/// channel.
#[derive(Debug)]
pub(crate) enum Feed {
    Live(BlockFills),
    Prices(PriceTable),
}
