//! settlectl: operator entry point for the settlement core.

mod commands;

use clap::Parser;
use franchise_settlement::SettlementConfig;
use franchise_types::{Commitment, Network};
use franchise_utils::LogFormat;
use std::path::PathBuf;

use commands::Command;

#[derive(Parser)]
#[command(name = "settlectl", about = "Franchise marketplace settlement tool")]
struct Cli {
    /// Cluster: "devnet", "testnet", "mainnet-beta" or "localnet".
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "SETTLE_NETWORK")]
    network: Option<Network>,

    /// RPC endpoint override.
    #[arg(long, env = "SETTLE_RPC_URL")]
    rpc_url: Option<String>,

    /// Commitment for confirmation and balance reads.
    #[arg(long, env = "SETTLE_COMMITMENT")]
    commitment: Option<Commitment>,

    /// Seconds to wait for confirmation before reporting an unknown outcome.
    #[arg(long, env = "SETTLE_CONFIRM_TIMEOUT")]
    confirm_timeout_secs: Option<u64>,

    /// JSON store holding wallet records, the transfer log and funding rounds.
    #[arg(long, env = "SETTLE_STORE")]
    store: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SETTLE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SETTLE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print Prometheus metrics after the command.
    #[arg(long)]
    metrics: bool,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "SETTLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn settlement_config(&self) -> anyhow::Result<SettlementConfig> {
        let mut config = match &self.config {
            Some(path) => SettlementConfig::from_toml_file(path)?,
            None => SettlementConfig::default(),
        };
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = Some(url.clone());
        }
        if let Some(commitment) = self.commitment {
            config.commitment = commitment;
        }
        if let Some(secs) = self.confirm_timeout_secs {
            config.confirm_timeout_secs = secs;
        }
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.settlement_config()?;
    franchise_utils::init_logging(config.log_format, &config.log_level);

    tracing::info!(
        network = %config.network,
        rpc = %config.rpc_endpoint(),
        commitment = %config.commitment,
        store = %config.store_path.display(),
        "settlectl starting"
    );

    let ctx = commands::Context::new(config)?;
    let outcome = commands::run(&ctx, cli.command).await;

    if cli.metrics {
        print!("{}", ctx.metrics.encode()?);
    }
    outcome
}
