use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::common::keccak256;
use crate::error::{Result, WhitelistError};

/// A 20-byte account identifier.
///
/// Parsing is case-insensitive; the canonical text form is the EIP-55
/// checksummed `0x` string, which is also what `Display` and serde produce.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parses an address from a hex string.
    ///
    /// # Arguments
    /// * `addr_str` - The address string, with or without "0x" prefix, any case
    ///
    /// # Errors
    /// Returns `InvalidIdentifier` if the address is not 40 hex characters or
    /// contains invalid hex
    pub fn parse(addr_str: &str) -> Result<Self> {
        let trimmed = addr_str.trim();
        let cleaned = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if cleaned.len() != 40 {
            return Err(WhitelistError::InvalidIdentifier(format!(
                "expected 40 hex chars, got {} in '{}'",
                cleaned.len(),
                addr_str
            )));
        }
        let mut address = [0u8; 20];
        hex::decode_to_slice(cleaned, &mut address).map_err(|e| {
            WhitelistError::InvalidIdentifier(format!("invalid hex in '{}': {}", addr_str, e))
        })?;
        Ok(Self(address))
    }

    /// Parses an address, rejecting mixed-case input whose casing is not a
    /// valid EIP-55 checksum. All-lowercase and all-uppercase input carry no
    /// checksum and are accepted.
    pub fn parse_checksummed(addr_str: &str) -> Result<Self> {
        let address = Self::parse(addr_str)?;
        let trimmed = addr_str.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *body {
            return Err(WhitelistError::InvalidIdentifier(format!(
                "bad checksum for '{}', expected {}",
                addr_str,
                address.to_checksum()
            )));
        }
        Ok(address)
    }

    /// Renders the EIP-55 mixed-case checksum form.
    ///
    /// A hex letter is uppercased when the matching nibble of
    /// `keccak256(lowercase_hex)` is 8 or greater.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Left-pads the address to a 32-byte ABI word.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..32].copy_from_slice(&self.0);
        word
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = WhitelistError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
