use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tollgate_client::LEDGER_URL_ENV;

#[derive(Parser)]
#[command(
    name = "tollgate",
    about = "Tollgate: per-user credit ledger guarding paid services",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
    /// Run the credit ledger service
    Serve(ServeArgs),
    /// Ask a ledger for one credit, as a downstream service would
    Check(CheckArgs),
    /// Print the effective ledger configuration
    Config(ConfigArgs),
}

/// Settings shared by `serve` and `config`. Flags override the file.
#[derive(Args, Debug, Default)]
pub struct LedgerArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Credits each account starts with
    #[arg(long)]
    pub starting_credits: Option<u64>,
    /// Account to provision; repeat for several. Replaces the configured list.
    #[arg(long = "account")]
    pub accounts: Vec<String>,
    /// Persist balances in a write-ahead log at this path
    #[arg(long)]
    pub wal: Option<PathBuf>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Identity to charge
    #[arg(short, long)]
    pub user: String,
    /// Ledger base URL
    #[arg(long, env = LEDGER_URL_ENV, default_value = "http://credit-service")]
    pub ledger_url: String,
    /// Round-trip timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}
