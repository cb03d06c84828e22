pub mod query;
pub mod watch;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::{Cluster, LedgerClient, RpcClient};
use crate::config::{ConnectorConfig, DEFAULT_CONFIG_PATH};
use crate::error::ConnectorError;

#[derive(Parser)]
#[command(name = "sol_connector")]
#[command(about = "Wallet connector: shows the connected account and its balance", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up the balance of an address once
    Balance {
        address: String,
        /// devnet, testnet, mainnet-beta or an RPC URL
        #[arg(long)]
        cluster: Option<String>,
    },
    /// Interactive wallet session with a live balance card
    Watch {
        /// Account to connect on start
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        cluster: Option<String>,
        /// Use an in-memory ledger instead of an RPC endpoint
        #[arg(long)]
        offline: bool,
    },
    /// Show the RPC endpoint and the node version it reports
    Status {
        #[arg(long)]
        cluster: Option<String>,
    },
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// CLI override first, then the config file.
pub fn resolve_cluster(
    config: &ConnectorConfig,
    cluster: Option<&str>,
) -> Result<Cluster, ConnectorError> {
    match cluster {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.cluster()?),
    }
}

pub fn rpc_client(
    config: &ConnectorConfig,
    cluster: &Cluster,
) -> Result<RpcClient, ConnectorError> {
    Ok(RpcClient::with_options(
        cluster.url().to_string(),
        config.rpc.commitment,
        config.request_timeout(),
    )?)
}

pub fn ledger_client(
    config: &ConnectorConfig,
    cluster: &Cluster,
) -> Result<Arc<dyn LedgerClient>, ConnectorError> {
    Ok(Arc::new(rpc_client(config, cluster)?))
}

pub fn handle_init_config(path: &std::path::Path, force: bool) -> Result<(), ConnectorError> {
    if path.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }
    ConnectorConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
