//! Watch entry point and event wiring.
//!
//! Producers (the live fill subscription and the fiat price poller) push
//! messages into an internal feed channel; a single ingestion loop consumes
//! it, owns all market state, and emits [`WatchEvent`]s to the caller.
//!
//! # Architecture
//!
//! - [`crate::market::Market`] - pure, synchronous state transitions
//! - [`WatchConfig`] - window, stride and retry configuration
//! - [`start`] - async entry point that spawns the producer and ingestion
//!   tasks
//!
//! The ingestion loop first replays history backward until the statistics
//! window is covered, then follows the chain tip. Statistics snapshots are
//! withheld until that initial backfill completes.

mod listener;
mod types;

pub use listener::{WatchConfig, start};
pub use types::{EventReceiver, WatchEvent};

pub(crate) use types::Feed;
