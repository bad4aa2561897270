use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::address::Address;
use crate::error::{Result, WhitelistError};
use crate::typed_data::Eip712Domain;

/// What to do when the same address appears more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Every position stays in the tree and is provable on its own.
    #[default]
    Keep,
    /// Fail before building.
    Reject,
}

/// Whitelist configuration file structure (YAML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistConfig {
    /// Whitelisted addresses, in tree order
    pub addresses: Vec<String>,

    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    /// Reject mixed-case addresses whose casing is not the EIP-55 checksum
    #[serde(default)]
    pub strict_checksum: bool,

    /// Where build-tree writes its export; overridden by `--output`
    pub output: Option<PathBuf>,

    /// EIP-712 domain used by `sign` and `recover`
    #[serde(default)]
    pub domain: Eip712Domain,
}

impl WhitelistConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self =
            serde_yaml::from_str(&contents).context("Failed to parse config YAML")?;
        Ok(config)
    }

    pub fn parse_addresses(&self) -> Result<Vec<Address>> {
        let parse = parser(self.strict_checksum);
        let addresses = self
            .addresses
            .iter()
            .map(|addr| parse(addr))
            .collect::<Result<Vec<_>>>()?;
        check_duplicates(&addresses, self.duplicates)?;
        Ok(addresses)
    }
}

/// Applies `policy` to `addresses`.
///
/// # Errors
/// `DuplicateIdentifier` under `DuplicatePolicy::Reject`.
pub fn check_duplicates(addresses: &[Address], policy: DuplicatePolicy) -> Result<()> {
    let mut seen = HashSet::with_capacity(addresses.len());
    for address in addresses {
        if !seen.insert(address) {
            match policy {
                DuplicatePolicy::Keep => {
                    warn!(address = %address, "duplicate address kept as separate leaf")
                }
                DuplicatePolicy::Reject => {
                    return Err(WhitelistError::DuplicateIdentifier(address.to_checksum()))
                }
            }
        }
    }
    Ok(())
}

/// Reads one address per line. Blank lines and `#` comments are skipped.
pub fn read_address_list(contents: &str) -> Result<Vec<Address>> {
    parse_lines(contents, Address::parse)
}

/// Like [`read_address_list`], but mixed-case lines must carry a valid
/// EIP-55 checksum.
pub fn read_checksummed_address_list(contents: &str) -> Result<Vec<Address>> {
    parse_lines(contents, Address::parse_checksummed)
}

fn parser(strict_checksum: bool) -> fn(&str) -> Result<Address> {
    if strict_checksum {
        Address::parse_checksummed
    } else {
        Address::parse
    }
}

fn parse_lines(contents: &str, parse: fn(&str) -> Result<Address>) -> Result<Vec<Address>> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse)
        .collect()
}
