//! One-shot commands: `balance` and `status`.

use tracing::info;

use super::{resolve_cluster, rpc_client};
use crate::account::{AccountId, Balance};
use crate::config::ConnectorConfig;
use crate::error::ConnectorError;

pub async fn handle_balance_command(
    config: &ConnectorConfig,
    address: &str,
    cluster: Option<&str>,
) -> Result<Balance, ConnectorError> {
    let account: AccountId = address.parse()?;
    let cluster = resolve_cluster(config, cluster)?;
    let client = rpc_client(config, &cluster)?;

    info!("Balance check for {} on {}", account, cluster);
    let balance = Balance::from_lamports(client.get_balance(&account).await?);

    println!("Address: {}", account);
    println!("Balance: {}", balance);
    Ok(balance)
}

pub async fn handle_status_command(
    config: &ConnectorConfig,
    cluster: Option<&str>,
) -> Result<(), ConnectorError> {
    let cluster = resolve_cluster(config, cluster)?;
    let client = rpc_client(config, &cluster)?;

    println!("Cluster:    {}", cluster.name());
    println!("Endpoint:   {}", client.url());
    println!("Commitment: {}", config.rpc.commitment);
    let version = client.get_version().await?;
    println!("Version:    {}", version);
    Ok(())
}
