//! Wallet session: the connect / disconnect / switch lifecycle.
//!
//! The session owns the currently selected account and publishes every
//! change on a watch channel. Subscribers see a new value on each connect
//! or switch, even when the same account is selected again.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::account::AccountId;
use crate::error::SessionError;

pub struct WalletSession {
    tx: watch::Sender<Option<AccountId>>,
}

impl WalletSession {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Connect on start when a remembered account is configured.
    pub fn auto_connect(&self, account: Option<AccountId>) -> Result<bool, SessionError> {
        match account {
            Some(account) => {
                info!("Auto-connecting wallet {}", account.short());
                self.connect(account)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn connect(&self, account: AccountId) -> Result<(), SessionError> {
        if let Some(current) = self.current() {
            return Err(SessionError::AlreadyConnected(current));
        }
        info!("Wallet connected: {}", account);
        self.tx.send_replace(Some(account));
        Ok(())
    }

    pub fn switch(&self, account: AccountId) -> Result<(), SessionError> {
        let previous = self.current().ok_or(SessionError::NotConnected)?;
        info!("Wallet switched: {} -> {}", previous.short(), account.short());
        self.tx.send_replace(Some(account));
        Ok(())
    }

    /// Idempotent; publishes only when an account was connected.
    pub fn disconnect(&self) {
        let was_connected = self.tx.send_if_modified(|current| current.take().is_some());
        if was_connected {
            info!("Wallet disconnected");
        } else {
            debug!("Disconnect requested with no wallet connected");
        }
    }

    pub fn current(&self) -> Option<AccountId> {
        *self.tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AccountId>> {
        self.tx.subscribe()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}
