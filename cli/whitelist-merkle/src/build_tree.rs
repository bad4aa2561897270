use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use whitelist_merkle::{
    check_duplicates, hex_encode, read_address_list, read_checksummed_address_list,
    write_file_atomic, Address, DuplicatePolicy, MerkleTree, WhitelistConfig, WhitelistExport,
};

const DEFAULT_OUTPUT: &str = "merkle_tree_data.json";

#[derive(Parser, Debug)]
#[command(about = "Build the whitelist Merkle tree and export root and proofs", long_about = None)]
pub struct Cli {
    /// Input file containing addresses (one per line)
    #[arg(short, long, conflicts_with = "config", required_unless_present = "config")]
    input: Option<PathBuf>,

    /// YAML whitelist configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON file [default: config `output` or merkle_tree_data.json]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail if an address appears more than once
    #[arg(long)]
    reject_duplicates: bool,

    /// Reject mixed-case addresses with an invalid EIP-55 checksum
    #[arg(long)]
    strict_checksum: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let (addresses, config_output) = load_addresses(&cli)?;

    println!("Total addresses: {}", addresses.len());
    println!("Building Merkle tree...");
    let tree = MerkleTree::from_addresses(&addresses).context("Failed to build Merkle tree")?;

    let export =
        WhitelistExport::from_tree(&tree, &addresses).context("Failed to assemble export")?;
    // every proof must check out before anything touches the disk
    export
        .verify_all()
        .context("Generated proofs failed self-verification")?;
    info!(
        leaves = tree.leaf_count(),
        depth = tree.depth(),
        "all proofs verified"
    );

    println!("Merkle root: {}", hex_encode(tree.root()));
    println!("Leaf count: {}", tree.leaf_count());
    println!("Tree depth: {}", tree.depth());

    let output = cli
        .output
        .or(config_output)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    println!("Writing export to {:?}...", output);
    let json_output = export.to_json_pretty().context("Failed to serialize JSON")?;
    write_file_atomic(&output, &json_output).context("Failed to write export file")?;

    println!("Done!");
    Ok(())
}

fn load_addresses(cli: &Cli) -> Result<(Vec<Address>, Option<PathBuf>)> {
    if let Some(config_path) = &cli.config {
        println!("Reading config from {:?}...", config_path);
        let mut config = WhitelistConfig::load(config_path)?;
        if cli.reject_duplicates {
            config.duplicates = DuplicatePolicy::Reject;
        }
        if cli.strict_checksum {
            config.strict_checksum = true;
        }
        let addresses = config
            .parse_addresses()
            .context("Invalid address in config")?;
        return Ok((addresses, config.output));
    }

    let input = cli
        .input
        .as_ref()
        .context("Either --input or --config is required")?;
    println!("Reading addresses from {:?}...", input);
    let contents = std::fs::read_to_string(input).context("Failed to open input file")?;
    let addresses = if cli.strict_checksum {
        read_checksummed_address_list(&contents)
    } else {
        read_address_list(&contents)
    }
    .context("Invalid address format")?;

    let policy = if cli.reject_duplicates {
        DuplicatePolicy::Reject
    } else {
        DuplicatePolicy::Keep
    };
    check_duplicates(&addresses, policy)?;
    Ok((addresses, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESSES: &str = "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4\n\
        0xAb8483F64d9C6d1EcF9b849Ae677dD3315835cb2\n\
        0x4B20993Bc481177ec7E8f571ceCaE8A9e22C02db\n";

    #[test]
    fn test_build_from_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("addresses.txt");
        let output = dir.path().join("tree.json");
        std::fs::write(&input, ADDRESSES).unwrap();

        run(Cli {
            input: Some(input),
            config: None,
            output: Some(output.clone()),
            reject_duplicates: false,
            strict_checksum: false,
        })
        .unwrap();

        let export =
            WhitelistExport::from_json(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(export.total, 3);
        assert_eq!(
            export.root,
            "0x74f4666169faccda89a45d47ab1997a62f24c3cd534a01539db8f0e40d3eb8b1"
        );
        export.verify_all().unwrap();
    }

    #[test]
    fn test_build_from_config_uses_config_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("whitelist.yaml");
        let output = dir.path().join("from-config.json");
        std::fs::write(
            &config,
            format!(
                "addresses:\n  - \"0x5B38Da6a701c568545dCfcB03FcB875f56beddC4\"\noutput: {:?}\n",
                output
            ),
        )
        .unwrap();

        run(Cli {
            input: None,
            config: Some(config),
            output: None,
            reject_duplicates: false,
            strict_checksum: false,
        })
        .unwrap();

        let export =
            WhitelistExport::from_json(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(export.total, 1);
        assert_eq!(
            export.root,
            "0x5931b4ed56ace4c46b68524cb5bcbf4195f1bbaacbe5228fbd090546c88dd229"
        );
    }

    #[test]
    fn test_reject_duplicates_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("addresses.txt");
        let output = dir.path().join("tree.json");
        std::fs::write(
            &input,
            "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4\n0x5b38da6a701c568545dcfcb03fcb875f56beddc4\n",
        )
        .unwrap();

        let result = run(Cli {
            input: Some(input),
            config: None,
            output: Some(output.clone()),
            reject_duplicates: true,
            strict_checksum: false,
        });
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_empty_input_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("addresses.txt");
        let output = dir.path().join("tree.json");
        std::fs::write(&input, "# nobody yet\n").unwrap();

        let result = run(Cli {
            input: Some(input),
            config: None,
            output: Some(output.clone()),
            reject_duplicates: false,
            strict_checksum: false,
        });
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_strict_checksum_rejects_bad_casing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("addresses.txt");
        let output = dir.path().join("tree.json");
        std::fs::write(&input, "0x5b38Da6a701c568545dCfcB03FcB875f56beddC4\n").unwrap();

        let cli = |strict_checksum| Cli {
            input: Some(input.clone()),
            config: None,
            output: Some(output.clone()),
            reject_duplicates: false,
            strict_checksum,
        };
        assert!(run(cli(true)).is_err());
        assert!(!output.exists());
        run(cli(false)).unwrap();
        assert!(output.exists());
    }
}
