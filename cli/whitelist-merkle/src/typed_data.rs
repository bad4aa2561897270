//! EIP-712 typed-data signatures for whitelist requests.
//!
//! A trusted signer authorizes `(user, nonce, expiry)` off-chain; the
//! whitelist contract recovers the signer from the same domain-separated
//! digest and compares it to its configured signer.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::address::Address;
use crate::common::{hex_encode, keccak256, Hash32};
use crate::error::{Result, WhitelistError};

pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const REQUEST_TYPE: &str = "WhitelistRequest(address user,uint256 nonce,uint256 expiry)";

/// Local development chain (hardhat / anvil).
pub const DEFAULT_CHAIN_ID: u64 = 31337;

pub const DEFAULT_VERIFYING_CONTRACT: Address = Address::new([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64, 0x2f,
    0x64, 0x18, 0x0a, 0xa3,
]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Default for Eip712Domain {
    fn default() -> Self {
        Self {
            name: "Whitelist".to_string(),
            version: "1.0.0".to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            verifying_contract: DEFAULT_VERIFYING_CONTRACT,
        }
    }
}

impl Eip712Domain {
    pub fn separator(&self) -> Hash32 {
        let mut encoded = Vec::with_capacity(32 * 5);
        encoded.extend_from_slice(&keccak256(DOMAIN_TYPE.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.name.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.version.as_bytes()));
        encoded.extend_from_slice(&uint256_word(self.chain_id));
        encoded.extend_from_slice(&self.verifying_contract.to_word());
        keccak256(&encoded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistRequest {
    pub user: Address,
    pub nonce: u64,
    pub expiry: u64,
}

impl WhitelistRequest {
    /// # Errors
    /// Returns `InvalidIdentifier` for the zero address.
    pub fn new(user: Address, nonce: u64, expiry: u64) -> Result<Self> {
        if user.is_zero() {
            return Err(WhitelistError::InvalidIdentifier(
                "zero address cannot be whitelisted".to_string(),
            ));
        }
        Ok(Self {
            user,
            nonce,
            expiry,
        })
    }

    pub fn struct_hash(&self) -> Hash32 {
        let mut encoded = Vec::with_capacity(32 * 4);
        encoded.extend_from_slice(&keccak256(REQUEST_TYPE.as_bytes()));
        encoded.extend_from_slice(&self.user.to_word());
        encoded.extend_from_slice(&uint256_word(self.nonce));
        encoded.extend_from_slice(&uint256_word(self.expiry));
        keccak256(&encoded)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expiry
    }
}

/// A request together with its signature, as written by `whitelist sign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    #[serde(flatten)]
    pub request: WhitelistRequest,
    pub signature: String,
    pub signer: Address,
}

/// The file written by `whitelist sign`: the domain the requests were signed
/// under, the request type string, and the signed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureFile {
    pub domain: Eip712Domain,
    pub types: String,
    pub signatures: Vec<SignedRequest>,
    /// Unix seconds
    pub generated_at: u64,
}

impl SignatureFile {
    pub fn new(domain: Eip712Domain, signatures: Vec<SignedRequest>) -> Self {
        Self {
            domain,
            types: REQUEST_TYPE.to_string(),
            signatures,
            generated_at: unix_now(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    /// `Serialization` for malformed JSON, `InvalidSignature` when the file
    /// was produced for a different request type.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(json)?;
        if file.types != REQUEST_TYPE {
            return Err(WhitelistError::InvalidSignature(format!(
                "unsupported request type '{}'",
                file.types
            )));
        }
        Ok(file)
    }
}

/// `keccak256(0x19 0x01 || domainSeparator || structHash)`
pub fn signing_hash(domain: &Eip712Domain, request: &WhitelistRequest) -> Hash32 {
    let mut encoded = Vec::with_capacity(2 + 32 + 32);
    encoded.extend_from_slice(&[0x19, 0x01]);
    encoded.extend_from_slice(&domain.separator());
    encoded.extend_from_slice(&request.struct_hash());
    keccak256(&encoded)
}

/// Signs `request` and returns the 65-byte `r || s || v` signature with
/// `v` in {27, 28}.
pub fn sign_request(
    signing_key: &SigningKey,
    domain: &Eip712Domain,
    request: &WhitelistRequest,
) -> Result<[u8; 65]> {
    let digest = signing_hash(domain, request);
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| WhitelistError::Signing(e.to_string()))?;

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = 27 + recovery_id.to_byte();
    debug!(user = %request.user, nonce = request.nonce, "signed whitelist request");
    Ok(out)
}

/// Recovers the address that produced `signature` over `request`.
///
/// `v` may be given as 0/1 or 27/28.
pub fn recover_signer(
    domain: &Eip712Domain,
    request: &WhitelistRequest,
    signature: &[u8],
) -> Result<Address> {
    if signature.len() != 65 {
        return Err(WhitelistError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }
    let v = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        other => {
            return Err(WhitelistError::InvalidSignature(format!(
                "invalid recovery byte {}",
                other
            )))
        }
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| WhitelistError::InvalidSignature(format!("invalid recovery id {}", v)))?;
    let signature = Signature::from_slice(&signature[..64])
        .map_err(|e| WhitelistError::InvalidSignature(e.to_string()))?;

    let digest = signing_hash(domain, request);
    let verifying_key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|e| WhitelistError::InvalidSignature(e.to_string()))?;
    Ok(address_from_verifying_key(&verifying_key))
}

pub fn verify_request_signature(
    domain: &Eip712Domain,
    request: &WhitelistRequest,
    signature: &[u8],
    expected_signer: &Address,
) -> Result<bool> {
    Ok(recover_signer(domain, request, signature)? == *expected_signer)
}

/// Signs `request` and checks the signature by recovering it, so a bad
/// signature is never handed out.
pub fn sign_and_check(
    signing_key: &SigningKey,
    domain: &Eip712Domain,
    request: &WhitelistRequest,
) -> Result<SignedRequest> {
    let signature = sign_request(signing_key, domain, request)?;
    let signer = address_from_signing_key(signing_key);
    if !verify_request_signature(domain, request, &signature, &signer)? {
        return Err(WhitelistError::Signing(format!(
            "recovered signer does not match {}",
            signer
        )));
    }
    Ok(SignedRequest {
        request: *request,
        signature: hex_encode(signature),
        signer,
    })
}

pub fn address_from_signing_key(signing_key: &SigningKey) -> Address {
    address_from_verifying_key(signing_key.verifying_key())
}

fn address_from_verifying_key(verifying_key: &VerifyingKey) -> Address {
    let encoded = verifying_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    Address::new(address)
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current unix time plus `hours`.
pub fn expiry_in_hours(hours: u64) -> u64 {
    unix_now().saturating_add(hours.saturating_mul(3600))
}

fn uint256_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..32].copy_from_slice(&value.to_be_bytes());
    word
}
