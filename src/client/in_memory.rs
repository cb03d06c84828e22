//! Offline ledger backed by an in-process balance table.
//!
//! Besides plain balances it can be told to fail a lookup, to never answer,
//! or to hold an answer until a gate is released. The CLI uses it for
//! `--offline` sessions; the view tests use the gates to control the order
//! in which lookups complete.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::debug;

use super::LedgerClient;
use crate::account::{AccountId, Lamports};
use crate::error::LookupError;

pub const IN_MEMORY_ENDPOINT: &str = "memory://ledger";

#[derive(Default)]
struct LedgerTable {
    balances: HashMap<AccountId, Lamports>,
    failures: HashMap<AccountId, String>,
    hanging: Vec<AccountId>,
    gates: HashMap<AccountId, Vec<oneshot::Receiver<()>>>,
}

/// Release handle for a held lookup. Dropping it also releases.
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Default)]
pub struct InMemoryLedger {
    table: Mutex<LedgerTable>,
    calls: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances<I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (AccountId, Lamports)>,
    {
        let ledger = Self::new();
        ledger.lock().balances.extend(balances);
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, LedgerTable> {
        // A panic while holding the lock leaves plain data behind, still usable
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_balance(&self, account: AccountId, lamports: Lamports) {
        self.lock().balances.insert(account, lamports);
    }

    /// Make lookups of `account` fail with `reason` until cleared.
    pub fn fail(&self, account: AccountId, reason: impl Into<String>) {
        self.lock().failures.insert(account, reason.into());
    }

    pub fn clear_failure(&self, account: &AccountId) {
        self.lock().failures.remove(account);
    }

    /// Make lookups of `account` never complete.
    pub fn hang(&self, account: AccountId) {
        self.lock().hanging.push(account);
    }

    /// Hold the next lookup of `account` until the returned gate is released.
    /// Gates queue up: each call holds one further lookup.
    pub fn hold(&self, account: AccountId) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.entry(account).or_default().push(rx);
        Gate(tx)
    }

    /// Number of lookups issued so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_balance(&self, account: &AccountId) -> Result<Lamports, LookupError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(call, account = %account.short(), "in-memory balance lookup");

        let (hang, gate) = {
            let mut table = self.lock();
            let gate = match table.gates.get_mut(account) {
                Some(queue) if !queue.is_empty() => Some(queue.remove(0)),
                _ => None,
            };
            (table.hanging.contains(account), gate)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = gate {
            // Sender dropped counts as released
            let _ = gate.await;
        }

        // Read after the gate so a held lookup sees the table at release time
        let table = self.lock();
        if let Some(reason) = table.failures.get(account) {
            return Err(LookupError::Unavailable(reason.clone()));
        }
        Ok(table.balances.get(account).copied().unwrap_or(0))
    }

    fn endpoint(&self) -> &str {
        IN_MEMORY_ENDPOINT
    }
}
