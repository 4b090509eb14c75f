//! 32-byte word helpers shared by action return values and parameter references.

use alloy::primitives::{Address, B256, U256};

pub fn word_from_u256(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

pub fn u256_from_word(word: B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// Left-pads the address into a word, as the ABI does.
pub fn word_from_address(address: Address) -> B256 {
    address.into_word()
}

/// Low 160 bits of the word; higher bits are ignored.
pub fn address_from_word(word: B256) -> Address {
    Address::from_slice(&word[12..])
}

/// Parse a decimal or `0x` hex amount. `max` resolves to `U256::MAX`.
pub fn parse_u256(raw: &str) -> Option<U256> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.eq_ignore_ascii_case("max") {
        return Some(U256::MAX);
    }
    if let Some(hex) = s.strip_prefix("0x") {
        return U256::from_str_radix(hex, 16).ok();
    }
    if s.chars().all(|c| c.is_ascii_digit() || c == '_') {
        return U256::from_str_radix(&s.replace('_', ""), 10).ok();
    }
    None
}
