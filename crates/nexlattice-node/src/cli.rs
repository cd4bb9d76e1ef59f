use clap::Parser;
use std::path::PathBuf;

/// NexLattice mesh node.
#[derive(Debug, Parser)]
#[command(name = "nexlattice-node", version, about)]
pub struct Cli {
    /// Path to the node's JSON configuration file.
    #[arg(long, default_value = "./config.json")]
    pub config: PathBuf,
}
