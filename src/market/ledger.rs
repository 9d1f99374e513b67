use crate::types::Trade;

/// Ordered-by-timestamp collection of trades, newest first.
///
/// Trades arrive in arbitrary order (live events can race ahead of
/// still-in-flight backfill batches), so each insert scans for the first
/// entry older than the new trade. Ties keep insertion order. Nothing is
/// ever deleted; the aggregation window is applied by readers.
#[derive(Clone, Debug, Default)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a trade at its timestamp-descending position and returns the
    /// insertion index.
    pub fn insert(&mut self, trade: Trade) -> usize {
        let index = self
            .trades
            .iter()
            .position(|existing| existing.timestamp < trade.timestamp)
            .unwrap_or(self.trades.len());
        self.trades.insert(index, trade);
        index
    }

    /// All trades, newest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
