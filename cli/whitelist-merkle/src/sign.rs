use anyhow::{Context, Result};
use clap::Parser;
use k256::ecdsa::SigningKey;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

use whitelist_merkle::{
    address_from_signing_key, expiry_in_hours, sign_and_check, write_file_atomic, Address,
    Eip712Domain, SignatureFile, WhitelistConfig, WhitelistRequest,
};

#[derive(Parser, Debug)]
#[command(about = "Sign EIP-712 whitelist requests", long_about = None)]
pub struct Cli {
    /// Signer private key (hex format, with or without 0x prefix)
    /// Alternatively, use "-" to read from stdin (more secure)
    #[arg(short = 'k', long)]
    private_key: String,

    /// Addresses to authorize
    #[arg(short, long, required = true, num_args = 1..)]
    user: Vec<String>,

    /// Request nonce
    #[arg(short, long, default_value_t = 0)]
    nonce: u64,

    /// Validity window in hours from now
    #[arg(short, long, default_value_t = 24)]
    expiry_hours: u64,

    /// YAML config providing the EIP-712 domain
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the domain chain id
    #[arg(long)]
    chain_id: Option<u64>,

    /// Override the domain verifying contract
    #[arg(long)]
    contract: Option<String>,

    /// Output JSON file
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    let domain = resolve_domain(
        Eip712Domain::default(),
        cli.config.as_deref(),
        cli.chain_id,
        cli.contract.as_deref(),
    )?;

    println!("Parsing private key...");
    let signing_key = read_signing_key(&cli.private_key)?;
    let signer = address_from_signing_key(&signing_key);
    println!("Signer address: {}", signer);

    let expiry = expiry_in_hours(cli.expiry_hours);
    let mut signed = Vec::with_capacity(cli.user.len());
    for user in &cli.user {
        let user = Address::parse(user).context("Invalid user address")?;
        let request = WhitelistRequest::new(user, cli.nonce, expiry)?;
        let entry = sign_and_check(&signing_key, &domain, &request)
            .with_context(|| format!("Failed to sign request for {}", user))?;
        println!("Signed request for {}", user);
        signed.push(entry);
    }

    let count = signed.len();
    let file = SignatureFile::new(domain.clone(), signed);
    println!("Writing signatures to {:?}...", cli.output);
    let json_output = file.to_json_pretty().context("Failed to serialize JSON")?;
    write_file_atomic(&cli.output, &json_output).context("Failed to write signature file")?;

    println!("\nSigned {} requests", count);
    println!("Domain: {} v{} chain {}", domain.name, domain.version, domain.chain_id);
    println!("Verifying contract: {}", domain.verifying_contract);
    println!("Expiry: {}", expiry);

    Ok(())
}

/// Starts from `base`; a config file replaces it, and `chain_id` /
/// `contract` override single fields on top.
pub(crate) fn resolve_domain(
    base: Eip712Domain,
    config: Option<&Path>,
    chain_id: Option<u64>,
    contract: Option<&str>,
) -> Result<Eip712Domain> {
    let mut domain = match config {
        Some(path) => WhitelistConfig::load(path)?.domain,
        None => base,
    };
    if let Some(chain_id) = chain_id {
        domain.chain_id = chain_id;
    }
    if let Some(contract) = contract {
        domain.verifying_contract =
            Address::parse(contract).context("Invalid verifying contract address")?;
    }
    Ok(domain)
}

fn read_signing_key(private_key: &str) -> Result<SigningKey> {
    let mut key_str = if private_key == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read private key from stdin")?;
        let trimmed = buffer.trim().to_string();
        buffer.zeroize();
        trimmed
    } else {
        private_key.trim().to_string()
    };

    let result = parse_signing_key(&key_str);
    key_str.zeroize();
    result
}

fn parse_signing_key(key_str: &str) -> Result<SigningKey> {
    let cleaned = key_str.strip_prefix("0x").unwrap_or(key_str);
    if cleaned.is_empty() {
        anyhow::bail!("Private key is empty");
    }
    let mut key_bytes = hex::decode(cleaned).context("Invalid private key format")?;
    if key_bytes.len() != 32 {
        let len = key_bytes.len();
        key_bytes.zeroize();
        anyhow::bail!("Invalid private key length: expected 32 bytes, got {}", len);
    }
    let signing_key = SigningKey::from_slice(&key_bytes).context("Invalid private key");
    key_bytes.zeroize();
    signing_key
}

/// Loads a signature file written by [`run`].
pub(crate) fn load_signature_file(path: &Path) -> Result<SignatureFile> {
    let contents = std::fs::read_to_string(path).context("Failed to read signature file")?;
    SignatureFile::from_json(&contents).context("Failed to parse signature JSON")
}
