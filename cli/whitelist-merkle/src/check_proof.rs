use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use whitelist_merkle::{Address, WhitelistExport};

#[derive(Parser, Debug)]
#[command(about = "Verify whitelist proofs from an exported tree", long_about = None)]
pub struct Cli {
    /// Export JSON written by build-tree
    #[arg(short, long)]
    data: PathBuf,

    /// Address to check (any case)
    #[arg(short, long, required_unless_present = "all")]
    address: Option<String>,

    /// Check every entry in the export
    #[arg(long, conflicts_with = "address")]
    all: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    println!("Reading export from {:?}...", cli.data);
    let contents = fs::read_to_string(&cli.data).context("Failed to read export file")?;
    let export = WhitelistExport::from_json(&contents).context("Failed to parse export JSON")?;
    println!("Root: {}", export.root);

    if cli.all {
        export.verify_all().context("Export failed verification")?;
        println!("All {} proofs verified", export.proofs.len());
        return Ok(());
    }

    let address_str = cli
        .address
        .as_deref()
        .context("Either --address or --all is required")?;
    let address = Address::parse(address_str).context("Invalid address")?;

    let verified = export
        .verify_entry(&address)
        .context("Malformed proof in export")?
        .with_context(|| format!("Address {} is not in the whitelist", address))?;

    let proof_len = export.proof_for(&address).map(Vec::len).unwrap_or(0);
    println!("Address: {}", address);
    println!("Proof length: {} nodes", proof_len);
    if !verified {
        anyhow::bail!("Proof for {} does not verify against root", address);
    }
    println!("Verification result: valid");

    Ok(())
}
