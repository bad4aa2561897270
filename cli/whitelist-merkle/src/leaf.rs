use crate::address::Address;
use crate::common::{keccak256, Hash32};
use crate::error::Result;

/// Converts an address to its 32-byte Merkle leaf.
///
/// The address is packed into exactly its 20 bytes before hashing, matching
/// Solidity's `keccak256(abi.encodePacked(addr))`.
pub fn encode_leaf(address: &Address) -> Hash32 {
    keccak256(address.as_bytes())
}

/// Parses an address string in any case and returns its leaf.
pub fn leaf_from_str(addr_str: &str) -> Result<Hash32> {
    let address = Address::parse(addr_str)?;
    Ok(encode_leaf(&address))
}

pub fn encode_leaves(addresses: &[Address]) -> Vec<Hash32> {
    addresses.iter().map(encode_leaf).collect()
}
