use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

use whitelist_merkle::{recover_signer, unix_now};

use crate::sign::{load_signature_file, resolve_domain};

#[derive(Parser, Debug)]
#[command(about = "Recover the signer of EIP-712 whitelist requests", long_about = None)]
pub struct Cli {
    /// Signature JSON written by `sign`
    #[arg(short, long)]
    pub(crate) input: PathBuf,

    /// YAML config whose EIP-712 domain replaces the one recorded in the file
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Override the domain chain id
    #[arg(long)]
    pub(crate) chain_id: Option<u64>,

    /// Override the domain verifying contract
    #[arg(long)]
    pub(crate) contract: Option<String>,
}

pub fn run(cli: &Cli) -> Result<()> {
    let file = load_signature_file(&cli.input)?;
    let domain = resolve_domain(
        file.domain.clone(),
        cli.config.as_deref(),
        cli.chain_id,
        cli.contract.as_deref(),
    )?;
    println!(
        "Domain: {} v{} chain {} contract {}",
        domain.name, domain.version, domain.chain_id, domain.verifying_contract
    );

    let now = unix_now();
    let mut mismatches = 0usize;
    for entry in &file.signatures {
        let cleaned = entry
            .signature
            .strip_prefix("0x")
            .unwrap_or(&entry.signature);
        let signature = hex::decode(cleaned).context("Invalid signature hex")?;
        let recovered = recover_signer(&domain, &entry.request, &signature)
            .with_context(|| format!("Failed to recover signer for {}", entry.request.user))?;

        let status = if entry.request.is_expired(now) {
            "expired"
        } else {
            "valid"
        };
        println!(
            "User {} nonce {} expiry {} ({}) -> signer {}",
            entry.request.user, entry.request.nonce, entry.request.expiry, status, recovered
        );
        if recovered != entry.signer {
            warn!(
                user = %entry.request.user,
                expected = %entry.signer,
                recovered = %recovered,
                "recovered signer does not match recorded signer"
            );
            mismatches += 1;
        }
    }

    let total = file.signatures.len();
    if mismatches > 0 {
        anyhow::bail!(
            "{} of {} signatures did not recover to the recorded signer",
            mismatches,
            total
        );
    }
    println!("\nAll {} signatures recovered to the recorded signer", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use whitelist_merkle::{sign_and_check, Address, Eip712Domain, SignatureFile, WhitelistRequest};

    fn write_signed(dir: &std::path::Path, domain: &Eip712Domain) -> PathBuf {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let request = WhitelistRequest::new(Address::new([9u8; 20]), 1, 2_000_000_000).unwrap();
        let signed = vec![sign_and_check(&key, domain, &request).unwrap()];
        let file = SignatureFile::new(domain.clone(), signed);
        let path = dir.join("signatures.json");
        std::fs::write(&path, file.to_json_pretty().unwrap()).unwrap();
        path
    }

    fn cli(input: PathBuf, chain_id: Option<u64>) -> Cli {
        Cli {
            input,
            config: None,
            chain_id,
            contract: None,
        }
    }

    #[test]
    fn test_recover_matching_domain() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_signed(dir.path(), &Eip712Domain::default());
        run(&cli(input, None)).unwrap();
    }

    #[test]
    fn test_recover_uses_recorded_domain() {
        let dir = tempfile::tempdir().unwrap();
        let domain = Eip712Domain {
            chain_id: 1,
            verifying_contract: Address::new([0x22; 20]),
            ..Eip712Domain::default()
        };
        let input = write_signed(dir.path(), &domain);
        run(&cli(input, None)).unwrap();
    }

    #[test]
    fn test_recover_override_other_chain_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_signed(dir.path(), &Eip712Domain::default());
        assert!(run(&cli(input, Some(1))).is_err());
    }

    #[test]
    fn test_recover_rejects_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("signatures.json");
        std::fs::write(&input, "[]").unwrap();
        assert!(run(&cli(input, None)).is_err());
    }
}
