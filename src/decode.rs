//! Fill-order call-data decoder.
//!
//! Reconstructs the signed order carried by a `fillOrder` transaction from
//! its raw call data. The layout is fixed: a 4-byte selector followed by
//! sixteen 32-byte words (five right-aligned addresses, six unsigned
//! integers, the requested fill amount, a flag, and the ECDSA signature
//! split across three words). Anything else is rejected before decoding.

use alloy::primitives::{Address, B256, U256, keccak256};
use alloy_sol_types::SolValue;

/// `fillOrder(address[5],uint256[6],uint256,bool,uint8,bytes32,bytes32)`
pub const FILL_ORDER_SELECTOR: [u8; 4] = [0xbc, 0x61, 0x39, 0x4a];

const WORD: usize = 32;
const NUM_WORDS: usize = 16;

/// Expected call data length of a `fillOrder` transaction.
pub const FILL_ORDER_CALL_LEN: usize = 4 + NUM_WORDS * WORD;

// Word indices within the call data body.
const MAKER: usize = 0;
const TAKER: usize = 1;
const MAKER_TOKEN: usize = 2;
const TAKER_TOKEN: usize = 3;
const FEE_RECIPIENT: usize = 4;
const MAKER_TOKEN_AMOUNT: usize = 5;
const TAKER_TOKEN_AMOUNT: usize = 6;
const MAKER_FEE: usize = 7;
const TAKER_FEE: usize = 8;
const EXPIRATION: usize = 9;
const SALT: usize = 10;
const SIGNATURE_V: usize = 13;
const SIGNATURE_R: usize = 14;
const SIGNATURE_S: usize = 15;

/// Order decoding failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Method selector is not the supported fill method.
    #[error("unsupported fill method: {0}")]
    UnsupportedMethod(String),

    /// Call data is shorter than the fixed `fillOrder` layout.
    #[error("call data too short: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Recomputed order hash does not match the one recorded with the trade.
    /// Indicates a decoding-assumption fault rather than a transient failure.
    #[error("order hash mismatch: computed {computed}, recorded {recorded}")]
    HashMismatch { computed: B256, recorded: B256 },
}

/// Order reconstructed from `fillOrder` call data.
#[derive(Clone, derive_more::Debug)]
pub struct FilledOrder {
    pub maker: Address,
    pub taker: Address,
    pub maker_token: Address,
    pub taker_token: Address,
    pub fee_recipient: Address,
    pub maker_token_amount: U256,
    pub taker_token_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub expiration: U256,
    pub salt: U256,
    pub signature_v: u8,
    pub signature_r: B256,
    pub signature_s: B256,
}

impl FilledOrder {
    /// Decodes an order from raw transaction call data.
    ///
    /// Validates the selector and the total length up front; no partial
    /// decoding is attempted on unsupported input.
    pub fn decode(input: &[u8]) -> Result<Self, DecodeError> {
        if input.len() < 4 || input[..4] != FILL_ORDER_SELECTOR {
            return Err(DecodeError::UnsupportedMethod(alloy::hex::encode_prefixed(
                &input[..input.len().min(4)],
            )));
        }
        if input.len() < FILL_ORDER_CALL_LEN {
            return Err(DecodeError::LengthMismatch {
                expected: FILL_ORDER_CALL_LEN,
                actual: input.len(),
            });
        }

        let word = |index: usize| &input[4 + index * WORD..4 + (index + 1) * WORD];
        let address = |index: usize| Address::from_slice(&word(index)[12..]);
        let uint = |index: usize| U256::from_be_slice(word(index));

        Ok(Self {
            maker: address(MAKER),
            taker: address(TAKER),
            maker_token: address(MAKER_TOKEN),
            taker_token: address(TAKER_TOKEN),
            fee_recipient: address(FEE_RECIPIENT),
            maker_token_amount: uint(MAKER_TOKEN_AMOUNT),
            taker_token_amount: uint(TAKER_TOKEN_AMOUNT),
            maker_fee: uint(MAKER_FEE),
            taker_fee: uint(TAKER_FEE),
            expiration: uint(EXPIRATION),
            salt: uint(SALT),
            signature_v: word(SIGNATURE_V)[WORD - 1],
            signature_r: B256::from_slice(word(SIGNATURE_R)),
            signature_s: B256::from_slice(word(SIGNATURE_S)),
        })
    }

    /// Canonical order hash, as computed by the exchange contract:
    /// keccak256 over the tightly packed order fields.
    pub fn order_hash(&self, exchange: Address) -> B256 {
        keccak256(
            (
                exchange,
                self.maker,
                self.taker,
                self.maker_token,
                self.taker_token,
                self.fee_recipient,
                self.maker_token_amount,
                self.taker_token_amount,
                self.maker_fee,
                self.taker_fee,
                self.expiration,
                self.salt,
            )
                .abi_encode_packed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    fn address_word(address: Address) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(address.as_slice());
        word
    }

    fn call_data(words: &[[u8; 32]; 16]) -> Vec<u8> {
        let mut data = FILL_ORDER_SELECTOR.to_vec();
        for word in words {
            data.extend_from_slice(word);
        }
        data
    }

    fn sample_words() -> [[u8; 32]; 16] {
        let mut words = [[0u8; 32]; 16];
        words[0] = address_word(address!("0x1111111111111111111111111111111111111111"));
        words[1] = address_word(address!("0x2222222222222222222222222222222222222222"));
        words[2] = address_word(address!("0x3333333333333333333333333333333333333333"));
        words[3] = address_word(address!("0x4444444444444444444444444444444444444444"));
        words[4] = address_word(address!("0x5555555555555555555555555555555555555555"));
        words[5] = U256::from(10u64).pow(U256::from(18)).to_be_bytes();
        words[6] = U256::from(5_000_000u64).to_be_bytes();
        words[7] = U256::from(100u64).to_be_bytes();
        words[8] = U256::from(200u64).to_be_bytes();
        words[9] = U256::from(1_700_000_000u64).to_be_bytes();
        words[10] = U256::from(424242u64).to_be_bytes();
        words[13][31] = 27;
        words[14] = [0xaa; 32];
        words[15] = [0xbb; 32];
        words
    }

    #[test]
    fn test_decode_fields() {
        let order = FilledOrder::decode(&call_data(&sample_words())).unwrap();

        assert_eq!(
            order.maker,
            address!("0x1111111111111111111111111111111111111111")
        );
        assert_eq!(
            order.taker,
            address!("0x2222222222222222222222222222222222222222")
        );
        assert_eq!(
            order.maker_token,
            address!("0x3333333333333333333333333333333333333333")
        );
        assert_eq!(
            order.taker_token,
            address!("0x4444444444444444444444444444444444444444")
        );
        assert_eq!(
            order.fee_recipient,
            address!("0x5555555555555555555555555555555555555555")
        );
        assert_eq!(
            order.maker_token_amount,
            U256::from(10u64).pow(U256::from(18))
        );
        assert_eq!(order.taker_token_amount, U256::from(5_000_000u64));
        assert_eq!(order.maker_fee, U256::from(100u64));
        assert_eq!(order.taker_fee, U256::from(200u64));
        assert_eq!(order.expiration, U256::from(1_700_000_000u64));
        assert_eq!(order.salt, U256::from(424242u64));
        assert_eq!(order.signature_v, 27);
        assert_eq!(order.signature_r, B256::from([0xaa; 32]));
        assert_eq!(order.signature_s, B256::from([0xbb; 32]));
    }

    #[test]
    fn test_decode_unknown_selector() {
        let mut data = call_data(&sample_words());
        data[0] = 0xde;
        assert!(matches!(
            FilledOrder::decode(&data),
            Err(DecodeError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_decode_truncated_input() {
        assert!(matches!(
            FilledOrder::decode(&[0xbc]),
            Err(DecodeError::UnsupportedMethod(_))
        ));

        let data = call_data(&sample_words());
        assert_eq!(
            FilledOrder::decode(&data[..data.len() - 1]).unwrap_err(),
            DecodeError::LengthMismatch {
                expected: FILL_ORDER_CALL_LEN,
                actual: FILL_ORDER_CALL_LEN - 1,
            }
        );
    }

    #[test]
    fn test_order_hash_sensitivity() {
        let exchange = address!("0x12459c951127e0c374ff9105dda097662a027093");
        let order = FilledOrder::decode(&call_data(&sample_words())).unwrap();
        let hash = order.order_hash(exchange);

        // Hash is a pure function of the order fields and exchange address.
        assert_eq!(hash, order.order_hash(exchange));

        let mut changed = sample_words();
        changed[10] = U256::from(424243u64).to_be_bytes();
        let other = FilledOrder::decode(&call_data(&changed)).unwrap();
        assert_ne!(hash, other.order_hash(exchange));

        // Signature words do not participate in the hash.
        let mut resigned = sample_words();
        resigned[14] = [0xcc; 32];
        let same = FilledOrder::decode(&call_data(&resigned)).unwrap();
        assert_eq!(hash, same.order_hash(exchange));
    }
}
