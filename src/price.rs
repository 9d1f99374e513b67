//! Fiat price feed.
//!
//! Periodically fetches the fiat price of every known token symbol (plus
//! the native asset, aliased onto the wrapped-native symbol) from a
//! CryptoCompare-style `pricemulti` endpoint. Successful polls reschedule
//! at the full period; failures retry at half the period without touching
//! the price table.

use std::{collections::HashMap, sync::Arc, time::Duration};

use fastnum::{UD256, decimal::Context};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

use crate::{error::WatchError, fill::Feed, registry::TokenRegistry};

const PRICE_API_URL: &str = "https://min-api.cryptocompare.com/data/pricemulti";

/// Native asset symbol requested alongside the registry tokens.
const NATIVE_SYMBOL: &str = "ETH";

/// Wrapped-native token symbol the native price is aliased onto.
const WRAPPED_NATIVE_SYMBOL: &str = "WETH";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response shape: symbol -> fiat code -> price.
type PriceResponse = HashMap<String, HashMap<String, f64>>;

/// Current fiat prices keyed by token symbol.
#[derive(Clone, Debug, Default)]
pub struct PriceTable {
    prices: HashMap<String, UD256>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<UD256> {
        self.prices.get(symbol).copied()
    }

    pub fn set(&mut self, symbol: &str, price: UD256) {
        self.prices.insert(symbol.to_string(), price);
    }

    /// Overlays `other` onto this table, replacing matching symbols.
    pub fn merge(&mut self, other: PriceTable) {
        self.prices.extend(other.prices);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Fiat price fetcher for a fixed quote currency.
#[derive(Clone, Debug)]
pub struct PriceFeed {
    client: reqwest::Client,
    currency: String,
}

impl PriceFeed {
    pub fn new(currency: &str) -> Result<Self, WatchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WatchError::Fatal(e.to_string()))?;
        Ok(Self {
            client,
            currency: currency.to_string(),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Fetches current prices for the given symbols plus the native asset,
    /// split across two batched requests. All-or-nothing: a failing batch
    /// fails the whole poll so the table never updates partially.
    pub async fn fetch(&self, symbols: &[String]) -> Result<PriceTable, WatchError> {
        let mut query: Vec<String> = vec![NATIVE_SYMBOL.to_string()];
        query.extend(
            symbols
                .iter()
                .filter(|symbol| symbol.as_str() != NATIVE_SYMBOL)
                .cloned(),
        );

        let mut table = PriceTable::new();
        let (first, second) = query.split_at(query.len().div_ceil(2));
        for batch in [first, second] {
            if batch.is_empty() {
                continue;
            }
            let response = self.fetch_batch(batch).await?;
            apply_response(&mut table, response, &self.currency);
        }

        if let Some(native) = table.get(NATIVE_SYMBOL) {
            table.set(WRAPPED_NATIVE_SYMBOL, native);
        }

        Ok(table)
    }

    async fn fetch_batch(&self, symbols: &[String]) -> Result<PriceResponse, WatchError> {
        let url = Url::parse_with_params(
            PRICE_API_URL,
            &[
                ("fsyms", symbols.join(",")),
                ("tsyms", self.currency.clone()),
            ],
        )
        .map_err(|e| WatchError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WatchError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(WatchError::Transport(format!(
                "price endpoint returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| WatchError::Transport(e.to_string()))
    }
}

/// Extracts prices in the requested currency into the table, skipping
/// symbols the endpoint omitted or returned as non-finite values.
fn apply_response(table: &mut PriceTable, response: PriceResponse, currency: &str) {
    for (symbol, quotes) in response {
        if let Some(price) = quotes.get(currency).copied().and_then(decimal_price) {
            table.set(&symbol, price);
        }
    }
}

fn decimal_price(value: f64) -> Option<UD256> {
    UD256::from_str(&value.to_string(), Context::default()).ok()
}

/// Poll loop: fetch, deliver, sleep; on failure sleep half the period and
/// try again. Runs until the feed channel closes.
pub(crate) async fn run<S, SFut>(
    feed: PriceFeed,
    registry: Arc<TokenRegistry>,
    period: Duration,
    tx: mpsc::Sender<Feed>,
    sleep: S,
) where
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    loop {
        let symbols = registry.symbols();
        match feed.fetch(&symbols).await {
            Ok(update) => {
                debug!(prices = update.len(), "fetched token prices");
                if tx.send(Feed::Prices(update)).await.is_err() {
                    // Receiver dropped, watch is shutting down.
                    return;
                }
                sleep(period).await;
            }
            Err(error) => {
                warn!(%error, "price fetch failed, retrying at half interval");
                sleep(period / 2).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

    #[test]
    fn test_decimal_price() {
        assert_eq!(decimal_price(0.2839), Some(udec256!(0.2839)));
        assert_eq!(decimal_price(305.0), Some(udec256!(305)));
        assert_eq!(decimal_price(f64::NAN), None);
        assert_eq!(decimal_price(f64::INFINITY), None);
    }

    #[test]
    fn test_apply_response_filters_currency() {
        let mut table = PriceTable::new();
        let response: PriceResponse = HashMap::from([
            (
                "ZRX".to_string(),
                HashMap::from([("USD".to_string(), 0.25), ("EUR".to_string(), 0.22)]),
            ),
            ("FOO".to_string(), HashMap::from([("EUR".to_string(), 1.0)])),
        ]);

        apply_response(&mut table, response, "USD");
        assert_eq!(table.get("ZRX"), Some(udec256!(0.25)));
        assert_eq!(table.get("FOO"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_merge_overlays() {
        let mut table = PriceTable::new();
        table.set("ZRX", udec256!(0.2));
        table.set("WETH", udec256!(300));

        let mut update = PriceTable::new();
        update.set("ZRX", udec256!(0.3));

        table.merge(update);
        assert_eq!(table.get("ZRX"), Some(udec256!(0.3)));
        assert_eq!(table.get("WETH"), Some(udec256!(300)));
    }
}
