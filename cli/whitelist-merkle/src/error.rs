use thiserror::Error;

pub type Result<T> = std::result::Result<T, WhitelistError>;

#[derive(Error, Debug)]
pub enum WhitelistError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Cannot build a Merkle tree from an empty leaf set")]
    EmptyLeafSet,

    #[error("Leaf index {index} is out of bounds for tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    #[error("Invalid proof format: {0}")]
    InvalidProofFormat(String),

    #[error("Duplicate identifier in whitelist: {0}")]
    DuplicateIdentifier(String),

    #[error("Proof does not verify against root for {0}")]
    ProofMismatch(String),

    #[error("Export is inconsistent: {0}")]
    InconsistentExport(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}
