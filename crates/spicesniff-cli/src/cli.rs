use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spicesniff",
    about = "SpiceSniff: tamper-evident provenance for spice purity readings",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP and WebSocket server
    Serve(ServeArgs),
    /// Store a batch document and anchor it on-chain
    Submit(SubmitArgs),
    /// Show an anchored batch with its document
    Fetch(FetchArgs),
    /// List every anchored batch
    List,
    /// Check content store and ledger reachability
    Status,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub batch: String,
    #[arg(long)]
    pub spice: String,
    /// JSON document to store
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct FetchArgs {
    pub batch: String,
}
