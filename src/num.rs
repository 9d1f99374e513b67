use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }
}

/// Converts a raw smallest-unit token quantity into a decimal quantity.
///
/// When the token's decimal count is known, the quantity is scaled down by
/// `10^decimals` and flagged as normalized. Otherwise the raw integer value
/// is passed through unscaled and flagged as unnormalized, so downstream
/// consumers can tell the two apart.
pub fn normalize_quantity(decimals: Option<u8>, raw: U256) -> (UD256, bool) {
    match decimals {
        Some(decimals) => (Converter::new(decimals).from_unsigned(raw), true),
        None => (Converter::new(0).from_unsigned(raw), false),
    }
}
