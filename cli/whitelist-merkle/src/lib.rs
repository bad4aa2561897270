//! Merkle commitments over address whitelists.
//!
//! Leaves are `keccak256(address)`, parents are `keccak256` of the sorted
//! sibling pair, and an unpaired node is promoted unchanged. Roots and proofs
//! are compatible with OpenZeppelin's `MerkleProof.verify`.

pub mod address;
pub mod common;
pub mod config;
pub mod error;
pub mod export;
pub mod leaf;
pub mod tree;
pub mod typed_data;
pub mod verify;

pub use address::Address;
pub use common::{
    decode_hash32, hash_sorted_pair, hex_encode, keccak256, write_file_atomic, Hash32,
};
pub use config::{
    check_duplicates, read_address_list, read_checksummed_address_list, DuplicatePolicy,
    WhitelistConfig,
};
pub use error::{Result, WhitelistError};
pub use export::WhitelistExport;
pub use leaf::{encode_leaf, encode_leaves, leaf_from_str};
pub use tree::MerkleTree;
pub use typed_data::{
    address_from_signing_key, expiry_in_hours, recover_signer, sign_and_check, sign_request,
    signing_hash, unix_now, verify_request_signature, Eip712Domain, SignatureFile, SignedRequest,
    WhitelistRequest,
};
pub use verify::{decode_proof, process_proof, verify_address, verify_hex_proof, verify_proof};
