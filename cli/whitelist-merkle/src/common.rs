use sha3::{Digest, Keccak256};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{Result, WhitelistError};

/// A 32-byte Keccak256 digest: a leaf, an inner node or a root.
pub type Hash32 = [u8; 32];

/// Computes the Keccak256 hash of `data`.
pub fn keccak256(data: &[u8]) -> Hash32 {
    Keccak256::digest(data).into()
}

/// Computes the parent of two sibling nodes.
///
/// The pair is sorted before concatenation, so `hash_sorted_pair(a, b)` and
/// `hash_sorted_pair(b, a)` are equal. This is the byte layout expected by
/// OpenZeppelin's `MerkleProof.verify` and by `merkletreejs` with
/// `sortPairs: true`.
///
/// # Arguments
/// * `a` - First 32-byte sibling
/// * `b` - Second 32-byte sibling
///
/// # Returns
/// `keccak256(min(a, b) || max(a, b))`
pub fn hash_sorted_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize()
        .into()
}

/// Encodes bytes as a lowercase `0x`-prefixed hex string.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes a `0x`-prefixed (or bare) hex string into a 32-byte digest.
///
/// # Errors
/// Returns `InvalidProofFormat` if the string is not exactly 64 hex chars.
pub fn decode_hash32(hex_str: &str) -> Result<Hash32> {
    let trimmed = hex_str.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != 64 {
        return Err(WhitelistError::InvalidProofFormat(format!(
            "expected 64 hex chars, got {} in '{}'",
            cleaned.len(),
            hex_str
        )));
    }
    let mut digest = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut digest).map_err(|e| {
        WhitelistError::InvalidProofFormat(format!("invalid hex in '{}': {}", hex_str, e))
    })?;
    Ok(digest)
}

/// Writes `contents` to `path` through a uniquely named temp file in the same
/// directory and a rename, so readers never observe a partially written file.
/// The temp file is removed if any step fails.
pub fn write_file_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}
