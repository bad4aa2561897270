use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::address::Address;
use crate::common::{decode_hash32, hex_encode};
use crate::error::{Result, WhitelistError};
use crate::leaf::encode_leaf;
use crate::tree::MerkleTree;
use crate::verify::{decode_proof, verify_proof};

/// The artifact handed to verifiers: the root, the leaf count, one proof per
/// checksummed address, and the addresses in tree order.
///
/// When an address appears more than once in the whitelist, `proofs` keeps
/// the proof of its first position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistExport {
    pub root: String,
    pub total: usize,
    pub proofs: BTreeMap<String, Vec<String>>,
    pub addresses: Vec<String>,
}

impl WhitelistExport {
    /// Builds the export for `tree`, whose leaves must be `addresses` in order.
    pub fn from_tree(tree: &MerkleTree, addresses: &[Address]) -> Result<Self> {
        if tree.leaf_count() != addresses.len() {
            return Err(WhitelistError::InconsistentExport(format!(
                "tree has {} leaves but {} addresses were given",
                tree.leaf_count(),
                addresses.len()
            )));
        }

        let all_proofs = tree.proofs();
        let mut proofs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (address, proof) in addresses.iter().zip(all_proofs) {
            let key = address.to_checksum();
            if proofs.contains_key(&key) {
                warn!(address = %key, "duplicate address, keeping first proof");
                continue;
            }
            proofs.insert(key, proof.iter().map(hex_encode).collect());
        }

        Ok(Self {
            root: hex_encode(tree.root()),
            total: tree.leaf_count(),
            proofs,
            addresses: addresses.iter().map(Address::to_checksum).collect(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Looks up the proof for `address`; the stored key is checksummed, so
    /// any casing of the input finds it.
    pub fn proof_for(&self, address: &Address) -> Option<&Vec<String>> {
        self.proofs.get(&address.to_checksum())
    }

    /// Verifies the stored proof for `address`.
    ///
    /// Returns `Ok(None)` when the address has no entry.
    pub fn verify_entry(&self, address: &Address) -> Result<Option<bool>> {
        let Some(proof) = self.proof_for(address) else {
            return Ok(None);
        };
        let root = decode_hash32(&self.root)?;
        let proof = decode_proof(proof)?;
        Ok(Some(verify_proof(&encode_leaf(address), &proof, &root)))
    }

    /// Checks every entry against the root.
    ///
    /// # Errors
    /// `InconsistentExport` when `total`, `addresses` and `proofs` disagree,
    /// `ProofMismatch` naming the first address whose proof fails,
    /// `InvalidIdentifier` / `InvalidProofFormat` for malformed entries.
    pub fn verify_all(&self) -> Result<()> {
        self.check_consistency()?;
        let root = decode_hash32(&self.root)?;
        for (key, proof) in &self.proofs {
            let address = Address::parse(key)?;
            let proof = decode_proof(proof)?;
            if !verify_proof(&encode_leaf(&address), &proof, &root) {
                return Err(WhitelistError::ProofMismatch(key.clone()));
            }
        }
        Ok(())
    }

    /// `total` must count `addresses`, and `addresses` and the keys of
    /// `proofs` must name the same set.
    fn check_consistency(&self) -> Result<()> {
        if self.addresses.len() != self.total {
            return Err(WhitelistError::InconsistentExport(format!(
                "total is {} but {} addresses are listed",
                self.total,
                self.addresses.len()
            )));
        }

        let mut listed = HashSet::with_capacity(self.addresses.len());
        for entry in &self.addresses {
            let address = Address::parse(entry)?;
            if self.proof_for(&address).is_none() {
                return Err(WhitelistError::InconsistentExport(format!(
                    "no proof for listed address {}",
                    address
                )));
            }
            listed.insert(address);
        }

        for key in self.proofs.keys() {
            if !listed.contains(&Address::parse(key)?) {
                return Err(WhitelistError::InconsistentExport(format!(
                    "proof for {} which is not in addresses",
                    key
                )));
            }
        }
        Ok(())
    }
}
