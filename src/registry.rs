//! Token metadata registry.
//!
//! Shared, read-mostly table of token metadata keyed by contract address.
//! Populated once at startup (static seed list, optionally extended from an
//! external registry) and injected into every component that needs symbol or
//! decimal lookups; nothing in the core mutates it after ingestion starts.

use alloy::primitives::{Address, address};
use dashmap::DashMap;
use itertools::Itertools;

/// Metadata of a single token contract.
#[derive(Clone, Debug)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
        }
    }
}

/// Address-keyed token metadata table.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: DashMap<Address, TokenInfo>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with well-known mainnet tokens.
    pub fn mainnet() -> Self {
        let registry = Self::new();
        let seed = [
            (
                address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
                TokenInfo::new("WETH", "Wrapped Ether", 18),
            ),
            (
                address!("0xe41d2489571d322189246dafa5ebde1f4699f498"),
                TokenInfo::new("ZRX", "0x Protocol Token", 18),
            ),
            (
                address!("0x89d24a6b4ccb1b6faa2625fe562bdd9a23260359"),
                TokenInfo::new("DAI", "Dai Stablecoin", 18),
            ),
            (
                address!("0x9f8f72aa9304c8b593d555f12ef6589cc3a579a2"),
                TokenInfo::new("MKR", "Maker", 18),
            ),
            (
                address!("0xa74476443119a942de498590fe1f2454d7d4ac0d"),
                TokenInfo::new("GNT", "Golem Network Token", 18),
            ),
            (
                address!("0xe94327d07fc17907b4db788e5adf2ed424addff6"),
                TokenInfo::new("REP", "Augur Reputation", 18),
            ),
            (
                address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                TokenInfo::new("USDC", "USD Coin", 6),
            ),
        ];
        for (address, info) in seed {
            registry.insert(address, info);
        }
        registry
    }

    /// Registers token metadata. Existing entries are kept as-is so an
    /// external registry cannot clobber the seed list.
    pub fn insert(&self, address: Address, info: TokenInfo) {
        self.tokens.entry(address).or_insert(info);
    }

    pub fn get(&self, address: Address) -> Option<TokenInfo> {
        self.tokens.get(&address).map(|info| info.value().clone())
    }

    pub fn decimals(&self, address: Address) -> Option<u8> {
        self.tokens.get(&address).map(|info| info.decimals)
    }

    pub fn symbol(&self, address: Address) -> Option<String> {
        self.tokens.get(&address).map(|info| info.symbol.clone())
    }

    /// All known token symbols, sorted and deduplicated.
    pub fn symbols(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|entry| entry.value().symbol.clone())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_seed() {
        let registry = TokenRegistry::mainnet();
        let weth = address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        assert_eq!(registry.symbol(weth).as_deref(), Some("WETH"));
        assert_eq!(registry.decimals(weth), Some(18));
        assert!(registry.symbols().is_sorted());
    }

    #[test]
    fn test_insert_keeps_existing() {
        let registry = TokenRegistry::mainnet();
        let zrx = address!("0xe41d2489571d322189246dafa5ebde1f4699f498");
        registry.insert(zrx, TokenInfo::new("BOGUS", "Bogus", 0));
        assert_eq!(registry.symbol(zrx).as_deref(), Some("ZRX"));
    }
}
