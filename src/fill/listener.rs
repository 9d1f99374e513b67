//! Watch listener implementation.

use std::{sync::Arc, time::Duration};

use alloy::providers::Provider;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::types::{EventReceiver, Feed, WatchEvent};
use crate::{
    Chain,
    backfill::Backfiller,
    blocks::BlockTimestamps,
    error::WatchError,
    market::Market,
    price::{self, PriceFeed},
    registry::TokenRegistry,
    stream,
    types::RawFill,
    unix_now,
};

/// Default channel buffer size.
const DEFAULT_CHANNEL_SIZE: usize = 100;

/// Rough average block interval used to size backfill strides.
const AVERAGE_BLOCK_TIME_SECS: u64 = 17;

const DEFAULT_WINDOW_SECS: u64 = 86_400;
const DEFAULT_BLOCK_RETRY: Duration = Duration::from_secs(15);
const DEFAULT_PRICE_PERIOD: Duration = Duration::from_secs(300);
const DEFAULT_CURRENCY: &str = "USD";

/// Watch configuration.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    window: u64,
    block_fetch_count: u64,
    block_retry: Duration,
    price_period: Duration,
    currency: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_SECS,
            block_fetch_count: DEFAULT_WINDOW_SECS.div_ceil(AVERAGE_BLOCK_TIME_SECS),
            block_retry: DEFAULT_BLOCK_RETRY,
            price_period: DEFAULT_PRICE_PERIOD,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl WatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the statistics window in seconds and resizes the backfill
    /// stride to match.
    pub fn with_window(mut self, window: u64) -> Self {
        self.window = window;
        self.block_fetch_count = window.div_ceil(AVERAGE_BLOCK_TIME_SECS);
        self
    }

    /// Sets the number of blocks fetched per backfill batch.
    pub fn with_block_fetch_count(mut self, block_fetch_count: u64) -> Self {
        self.block_fetch_count = block_fetch_count;
        self
    }

    /// Sets the fixed delay between block/transaction lookup retries.
    pub fn with_block_retry(mut self, block_retry: Duration) -> Self {
        self.block_retry = block_retry;
        self
    }

    /// Sets the fiat price poll period. Failed polls retry at half of it.
    pub fn with_price_period(mut self, price_period: Duration) -> Self {
        self.price_period = price_period;
        self
    }

    /// Sets the fiat currency code prices are quoted in.
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn block_fetch_count(&self) -> u64 {
        self.block_fetch_count
    }

    pub fn block_retry(&self) -> Duration {
        self.block_retry
    }

    pub fn price_period(&self) -> Duration {
        self.price_period
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Starts the watch.
///
/// Verifies the provider is connected to the configured chain, then spawns
/// the live fill subscription and the fiat price poller as producers, and a
/// single ingestion loop that owns all market state. The loop backfills
/// history until the statistics window is covered before following the
/// chain tip.
///
/// Returns the event receiver and a handle to the ingestion task. Dropping
/// the receiver shuts the watch down gracefully.
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(TokenRegistry::mainnet());
/// let (mut rx, handle) =
///     fill::start(&chain, provider, registry, WatchConfig::new(), tokio::time::sleep).await?;
///
/// while let Some(event) = rx.recv().await {
///     match event {
///         WatchEvent::Trade { index, trade } => println!("#{index}: {trade:?}"),
///         WatchEvent::Fetching { count, done } => println!("fetched {count} (done: {done})"),
///         WatchEvent::Statistics(stats) => println!("{} trades in window", stats.volume.total_trades),
///     }
/// }
/// ```
pub async fn start<P, S, SFut>(
    chain: &Chain,
    provider: P,
    registry: Arc<TokenRegistry>,
    config: WatchConfig,
    sleep: S,
) -> Result<
    (
        EventReceiver,
        tokio::task::JoinHandle<Result<(), WatchError>>,
    ),
    WatchError,
>
where
    P: Provider + Clone + Send + 'static,
    S: Fn(Duration) -> SFut + Copy + Send + 'static,
    SFut: Future<Output = ()> + Send + 'static,
{
    let chain_id = provider.get_chain_id().await.map_err(WatchError::from)?;
    if chain_id != chain.chain_id() {
        return Err(WatchError::UnsupportedNetwork(chain_id));
    }
    let head = provider.get_block_number().await.map_err(WatchError::from)?;
    info!(chain_id, head, "connected");

    let (feed_tx, feed_rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let (event_tx, event_rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let price_feed = PriceFeed::new(config.currency())?;
    tokio::spawn(price::run(
        price_feed,
        registry.clone(),
        config.price_period(),
        feed_tx.clone(),
        sleep,
    ));

    tokio::spawn(run_live(
        chain.clone(),
        provider.clone(),
        head + 1,
        config.block_retry(),
        feed_tx,
        sleep,
    ));

    let chain = chain.clone();
    let handle = tokio::spawn(async move {
        run_listener(chain, provider, registry, config, head, feed_rx, event_tx, sleep).await
    });

    Ok((EventReceiver::new(event_rx), handle))
}

/// Live producer: forwards per-block fill batches into the feed channel.
/// Stream errors leave the block cursor in place, so the same block is
/// retried after a delay.
async fn run_live<P, S, SFut>(
    chain: Chain,
    provider: P,
    from_block: u64,
    retry: Duration,
    tx: mpsc::Sender<Feed>,
    sleep: S,
) where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let fills = stream::fills(&chain, provider, from_block, sleep);
    futures::pin_mut!(fills);

    while let Some(result) = fills.next().await {
        match result {
            Ok(block) => {
                if tx.send(Feed::Live(block)).await.is_err() {
                    // Receiver dropped, graceful shutdown
                    break;
                }
            }
            Err(error) => {
                warn!(%error, "fill subscription error, retrying");
                sleep(retry).await;
            }
        }
    }
}

/// The single ingestion loop. Owns the market state; every mutation runs to
/// completion here, so the ledger, history, dedup set and price table need
/// no locking.
#[allow(clippy::too_many_arguments)]
async fn run_listener<P, S, SFut>(
    chain: Chain,
    provider: P,
    registry: Arc<TokenRegistry>,
    config: WatchConfig,
    head: u64,
    mut feed_rx: mpsc::Receiver<Feed>,
    events: mpsc::Sender<WatchEvent>,
    sleep: S,
) -> Result<(), WatchError>
where
    P: Provider + Clone,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let mut market = Market::new(&chain, registry, config.window());
    let mut clock = BlockTimestamps::new(provider.clone(), config.block_retry());
    let mut backfiller = Backfiller::new(&chain, provider, head, config.block_fetch_count());

    // Extend backfill coverage until the window is met or history runs out.
    loop {
        let covered = match backfiller.oldest_block() {
            None => false,
            Some(block) => {
                let oldest = clock.get(block, sleep).await;
                unix_now().saturating_sub(oldest) >= config.window()
            }
        };
        if covered {
            break;
        }
        if backfiller.at_genesis() {
            warn!("exchange history exhausted before covering the statistics window");
            break;
        }

        match backfiller.next_batch().await {
            Ok(fills) => {
                for fill in &fills {
                    if !process_fill(&mut market, &mut clock, fill, &events, sleep).await {
                        return Ok(());
                    }
                }
            }
            Err(error) => {
                warn!(%error, "backfill batch failed, retrying");
                sleep(config.block_retry()).await;
            }
        }
    }

    market.finish_initial_fetch();
    info!(trades = market.ledger().len(), "initial backfill complete");
    let done = WatchEvent::Fetching {
        count: market.ledger().len(),
        done: true,
    };
    if events.send(done).await.is_err() || !emit_statistics(&mut market, &events).await {
        return Ok(());
    }

    // Follow the feed: live fills and price updates, in arrival order.
    while let Some(feed) = feed_rx.recv().await {
        match feed {
            Feed::Live(block) => {
                if let Some(timestamp) = block.block_timestamp {
                    clock.record(block.block_number, timestamp);
                }
                for fill in &block.fills {
                    if !process_fill(&mut market, &mut clock, fill, &events, sleep).await {
                        return Ok(());
                    }
                }
            }
            Feed::Prices(update) => {
                market.apply_prices(update);
                if !emit_statistics(&mut market, &events).await {
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

/// Ingests one raw fill: dedup + normalize, resolve the block timestamp
/// (the sole suspension point of normalization), commit, and notify.
/// Returns false when the event receiver is gone.
async fn process_fill<P, S, SFut>(
    market: &mut Market,
    clock: &mut BlockTimestamps<P>,
    fill: &RawFill,
    events: &mpsc::Sender<WatchEvent>,
    sleep: S,
) -> bool
where
    P: Provider,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let Some(pending) = market.prepare(fill) else {
        return true;
    };

    let timestamp = clock.get(pending.block_number(), sleep).await;
    let (index, trade) = market.commit(pending, timestamp);

    if events.send(WatchEvent::Trade { index, trade }).await.is_err() {
        return false;
    }

    if market.initial_fetch_done() {
        emit_statistics(market, events).await
    } else {
        let progress = WatchEvent::Fetching {
            count: market.ledger().len(),
            done: false,
        };
        events.send(progress).await.is_ok()
    }
}

/// Recomputes and delivers a statistics snapshot, unless suppressed by the
/// initial-backfill gate. Returns false when the event receiver is gone.
async fn emit_statistics(market: &mut Market, events: &mpsc::Sender<WatchEvent>) -> bool {
    match market.statistics(unix_now()) {
        Some(statistics) => events
            .send(WatchEvent::Statistics(Box::new(statistics)))
            .await
            .is_ok(),
        None => true,
    }
}
