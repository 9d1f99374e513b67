use std::collections::{HashMap, VecDeque};

use fastnum::UD256;

/// One time-series sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: u64,
    pub value: UD256,
}

#[derive(Clone, Debug, Default)]
struct PairSeries {
    timestamps: VecDeque<u64>,
    prices: VecDeque<UD256>,
    volumes: VecDeque<UD256>,
}

#[derive(Clone, Copy)]
enum SeriesKind {
    Price,
    Volume,
}

/// Bidirectional, pair-indexed price/volume time series.
///
/// Every insert records both directions of a pair: the mirror series holds
/// the reciprocal price and the opposite-side volume at the same timestamps,
/// so a chart can flip quote/base without re-deriving data. Series are kept
/// in ascending timestamp order and pruned to the statistics window.
#[derive(Clone, Debug, Default)]
pub struct PriceVolumeHistory {
    pairs: Vec<String>,
    series: HashMap<(String, String), PairSeries>,
}

impl PriceVolumeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one trade's price/volume observation for a maker/taker symbol
    /// pair, in both directions, keeping timestamp order.
    pub fn insert(
        &mut self,
        maker: &str,
        taker: &str,
        timestamp: u64,
        mt_price: UD256,
        tm_price: UD256,
        maker_volume: UD256,
        taker_volume: UD256,
    ) {
        self.initialize(maker, taker);
        self.initialize(taker, maker);

        let index = self
            .series
            .get(&(maker.to_string(), taker.to_string()))
            .map(|series| {
                series
                    .timestamps
                    .iter()
                    .position(|existing| *existing > timestamp)
                    .unwrap_or(series.timestamps.len())
            })
            .unwrap_or_default();

        self.insert_at(maker, taker, index, timestamp, mt_price, taker_volume);
        self.insert_at(taker, maker, index, timestamp, tm_price, maker_volume);
    }

    /// Price series for a `"QUOTE/BASE"` pair key, oldest first.
    /// Empty when the pair is unknown.
    pub fn price_data(&self, pair: &str) -> Vec<Sample> {
        self.samples(pair, SeriesKind::Price)
    }

    /// Volume series for a `"QUOTE/BASE"` pair key, oldest first.
    /// Empty when the pair is unknown.
    pub fn volume_data(&self, pair: &str) -> Vec<Sample> {
        self.samples(pair, SeriesKind::Volume)
    }

    /// Known pair keys, sorted. Contains both directions of every pair.
    pub fn pairs(&self) -> &[String] {
        &self.pairs
    }

    /// Drops all samples older than `cutoff`, removing pairs that become
    /// empty. Returns whether anything was pruned.
    pub fn prune(&mut self, cutoff: u64) -> bool {
        let mut pruned = false;
        let mut keys: Vec<(String, String)> = self
            .series
            .keys()
            .filter(|(from, to)| from <= to)
            .cloned()
            .collect();
        keys.sort();

        for (from, to) in keys {
            let expired = self
                .series
                .get(&(from.clone(), to.clone()))
                .map(|series| {
                    series
                        .timestamps
                        .iter()
                        .take_while(|timestamp| **timestamp < cutoff)
                        .count()
                })
                .unwrap_or_default();
            if expired == 0 {
                continue;
            }
            pruned = true;

            self.drop_front(&from, &to, expired);
            if from != to {
                self.drop_front(&to, &from, expired);
            }

            let emptied = self
                .series
                .get(&(from.clone(), to.clone()))
                .is_some_and(|series| series.timestamps.is_empty());
            if emptied {
                self.series.remove(&(from.clone(), to.clone()));
                self.series.remove(&(to.clone(), from.clone()));
                self.remove_pair(&format!("{from}/{to}"));
                if from != to {
                    self.remove_pair(&format!("{to}/{from}"));
                }
            }
        }

        pruned
    }

    fn initialize(&mut self, from: &str, to: &str) {
        let key = (from.to_string(), to.to_string());
        if !self.series.contains_key(&key) {
            self.series.insert(key, PairSeries::default());
            let pair = format!("{from}/{to}");
            if let Err(position) = self.pairs.binary_search(&pair) {
                self.pairs.insert(position, pair);
            }
        }
    }

    fn insert_at(
        &mut self,
        from: &str,
        to: &str,
        index: usize,
        timestamp: u64,
        price: UD256,
        volume: UD256,
    ) {
        if let Some(series) = self.series.get_mut(&(from.to_string(), to.to_string())) {
            series.timestamps.insert(index, timestamp);
            series.prices.insert(index, price);
            series.volumes.insert(index, volume);
        }
    }

    fn drop_front(&mut self, from: &str, to: &str, count: usize) {
        if let Some(series) = self.series.get_mut(&(from.to_string(), to.to_string())) {
            series.timestamps.drain(..count);
            series.prices.drain(..count);
            series.volumes.drain(..count);
        }
    }

    fn samples(&self, pair: &str, kind: SeriesKind) -> Vec<Sample> {
        let Some((quote, base)) = pair.split_once('/') else {
            return Vec::new();
        };
        self.series
            .get(&(base.to_string(), quote.to_string()))
            .map(|series| {
                let values = match kind {
                    SeriesKind::Price => &series.prices,
                    SeriesKind::Volume => &series.volumes,
                };
                series
                    .timestamps
                    .iter()
                    .zip(values.iter())
                    .map(|(timestamp, value)| Sample {
                        timestamp: *timestamp,
                        value: *value,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn remove_pair(&mut self, pair: &str) {
        if let Ok(position) = self.pairs.binary_search_by(|known| known.as_str().cmp(pair)) {
            self.pairs.remove(position);
        }
    }
}
