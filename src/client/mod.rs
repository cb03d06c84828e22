// Client module
pub mod cluster;
pub mod connection;
pub mod in_memory;
pub mod rpc_client;

use async_trait::async_trait;

use crate::account::{AccountId, Lamports};
use crate::error::LookupError;

pub use cluster::{Cluster, Commitment};
pub use connection::{ClientHandle, ConnectionProvider};
pub use in_memory::InMemoryLedger;
pub use rpc_client::RpcClient;

/// Balance lookups keyed by account.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_balance(&self, account: &AccountId) -> Result<Lamports, LookupError>;

    /// Endpoint this client talks to, for logs and the status line.
    fn endpoint(&self) -> &str;
}
