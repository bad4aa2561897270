//! Stateless proof verification.
//!
//! Nothing here needs a [`MerkleTree`](crate::tree::MerkleTree): a leaf, a
//! proof and a root are enough, which is exactly what an on-chain verifier
//! receives.

use crate::address::Address;
use crate::common::{decode_hash32, hash_sorted_pair, Hash32};
use crate::error::Result;
use crate::leaf::encode_leaf;

/// Folds `proof` over `leaf` with the sorted-pair hash and returns the
/// resulting root.
pub fn process_proof(leaf: &Hash32, proof: &[Hash32]) -> Hash32 {
    proof
        .iter()
        .fold(*leaf, |current, sibling| hash_sorted_pair(&current, sibling))
}

/// Returns true if `proof` connects `leaf` to `root`.
pub fn verify_proof(leaf: &Hash32, proof: &[Hash32], root: &Hash32) -> bool {
    process_proof(leaf, proof) == *root
}

pub fn verify_address(address: &Address, proof: &[Hash32], root: &Hash32) -> bool {
    verify_proof(&encode_leaf(address), proof, root)
}

/// Decodes a hex-encoded proof.
///
/// # Errors
/// Returns `InvalidProofFormat` if any element is not a 32-byte hex digest.
pub fn decode_proof<S: AsRef<str>>(proof: &[S]) -> Result<Vec<Hash32>> {
    proof.iter().map(|node| decode_hash32(node.as_ref())).collect()
}

/// Verifies a hex-encoded proof against a hex-encoded root.
///
/// A proof that does not reach `root` yields `Ok(false)`; only malformed
/// input is an error.
pub fn verify_hex_proof<S: AsRef<str>>(leaf: &Hash32, proof: &[S], root: &str) -> Result<bool> {
    let root = decode_hash32(root)?;
    let proof = decode_proof(proof)?;
    Ok(verify_proof(leaf, &proof, &root))
}
