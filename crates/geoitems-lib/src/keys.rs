//! Item identifiers and the partition key derived from them.
//!
//! Metadata records are partitioned by a number taken from the digits of the
//! item id, while the range key is the full id. Every read and write goes
//! through [`PartitionKey::derive`] so the two can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flickr-style base58 alphabet (no `0`, `O`, `I` or `l`).
const BASE58_ALPHABET: &[u8; 58] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of an encoded 128-bit id; shorter encodings are left-padded.
const ID_LENGTH: usize = 22;

/// Maximum significant digits of a DynamoDB number.
const MAX_KEY_DIGITS: usize = 38;

/// Opaque item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(encode_base58(Uuid::new_v4().as_u128()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn encode_base58(mut value: u128) -> String {
    let mut digits = Vec::with_capacity(ID_LENGTH);
    while value > 0 {
        digits.push(BASE58_ALPHABET[(value % 58) as usize]);
        value /= 58;
    }
    while digits.len() < ID_LENGTH {
        digits.push(BASE58_ALPHABET[0]);
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Numeric partition key of a metadata record, kept as its canonical decimal
/// string so it round-trips through DynamoDB without precision loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Derive the partition key for an item id.
    ///
    /// Non-digit characters are dropped and the remaining digits read as a
    /// decimal number: leading zeros are removed, no digits at all gives `0`,
    /// and only the first 38 significant digits are kept.
    pub fn derive(id: &str) -> Self {
        let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Self("0".to_string());
        }
        Self(significant.chars().take(MAX_KEY_DIGITS).collect())
    }

    /// Wrap a stored number, normalizing it the same way [`derive`](Self::derive) does.
    pub fn from_stored(value: &str) -> Self {
        Self::derive(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
