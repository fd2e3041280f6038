//! Syntactic address checks used by the Truth gate
//!
//! Only the shape is checked; nothing here resolves or decodes an address.

use serde::{Deserialize, Serialize};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// What the Truth gate does with a malformed address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AddressValidationMode {
    /// Pass silently
    Ignore,
    /// Log a warning and pass
    Warn,
    /// Fail the gate
    #[default]
    Strict,
}

/// Base58 account address, 32 to 44 characters (Solana-style)
pub fn is_base58_address(value: &str) -> bool {
    (32..=44).contains(&value.len()) && value.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// `0x`-prefixed 20-byte hex address (EVM-style)
pub fn is_hex_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Accepts either supported address shape
pub fn is_valid_address(value: &str) -> bool {
    is_base58_address(value) || is_hex_address(value)
}

/// Key used for blocklist membership
///
/// Hex addresses are case-insensitive and compare in lowercase. Base58 is
/// case-sensitive and only trimmed.
pub fn canonical_address(value: &str) -> String {
    let value = value.trim();
    if is_hex_address(value) {
        value.to_ascii_lowercase()
    } else {
        value.to_string()
    }
}
