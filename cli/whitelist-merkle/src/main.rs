#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build_tree;
mod check_proof;
mod recover;
mod sign;

#[derive(Parser, Debug)]
#[command(name = "whitelist")]
#[command(about = "Merkle whitelist and EIP-712 signature tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    BuildTree(build_tree::Cli),
    Verify(check_proof::Cli),
    Sign(sign::Cli),
    Recover(recover::Cli),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args)?,
        Commands::Verify(args) => check_proof::run(&args)?,
        Commands::Sign(args) => sign::run(args)?,
        Commands::Recover(args) => recover::run(&args)?,
    }

    Ok(())
}
