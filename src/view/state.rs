use chrono::{DateTime, Utc};

use crate::account::{AccountId, Balance};

/// What the balance card currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceState {
    /// No wallet connected. There is no balance without an account.
    NoAccount,
    /// Lookup in flight; any previous value has been discarded.
    Loading { account: AccountId },
    Ready {
        account: AccountId,
        balance: Balance,
        fetched_at: DateTime<Utc>,
    },
    Failed { account: AccountId, reason: String },
}

impl BalanceState {
    /// Account the state refers to, if any.
    pub fn account(&self) -> Option<&AccountId> {
        match self {
            BalanceState::NoAccount => None,
            BalanceState::Loading { account }
            | BalanceState::Ready { account, .. }
            | BalanceState::Failed { account, .. } => Some(account),
        }
    }

    pub fn balance(&self) -> Option<Balance> {
        match self {
            BalanceState::Ready { balance, .. } => Some(*balance),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, BalanceState::Loading { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BalanceState::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BalanceState::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceState::NoAccount => "no_account",
            BalanceState::Loading { .. } => "loading",
            BalanceState::Ready { .. } => "ready",
            BalanceState::Failed { .. } => "failed",
        }
    }
}

impl Default for BalanceState {
    fn default() -> Self {
        BalanceState::NoAccount
    }
}
