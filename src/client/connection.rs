//! Connection provider: hands out the current ledger client handle and
//! issues a fresh one whenever the endpoint changes.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::LedgerClient;

/// A ledger client plus the generation it was issued under.
///
/// Two handles are the same connection only if their generations match,
/// even when they point at the same endpoint.
#[derive(Clone)]
pub struct ClientHandle {
    pub generation: u64,
    pub client: Arc<dyn LedgerClient>,
}

impl ClientHandle {
    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("generation", &self.generation)
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

pub struct ConnectionProvider {
    tx: watch::Sender<ClientHandle>,
}

impl ConnectionProvider {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        info!("Ledger connection: {}", client.endpoint());
        let (tx, _rx) = watch::channel(ClientHandle { generation: 0, client });
        Self { tx }
    }

    pub fn current(&self) -> ClientHandle {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientHandle> {
        self.tx.subscribe()
    }

    /// Install a new client; subscribers are notified even if the endpoint
    /// is unchanged. Returns the new handle's generation.
    pub fn replace(&self, client: Arc<dyn LedgerClient>) -> u64 {
        let generation = self.tx.borrow().generation + 1;
        info!(generation, "Ledger connection replaced: {}", client.endpoint());
        self.tx.send_replace(ClientHandle { generation, client });
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryLedger;

    #[tokio::test]
    async fn test_replace_bumps_generation_and_notifies() {
        let provider = ConnectionProvider::new(Arc::new(InMemoryLedger::new()));
        let mut rx = provider.subscribe();
        assert_eq!(provider.current().generation, 0);

        let generation = provider.replace(Arc::new(InMemoryLedger::new()));
        assert_eq!(generation, 1);

        rx.changed().await.unwrap();
        let handle = rx.borrow_and_update().clone();
        assert_eq!(handle.generation, 1);
        assert_eq!(handle.endpoint(), crate::client::in_memory::IN_MEMORY_ENDPOINT);
    }
}
