//! Account balance synchronization.
//!
//! `AccountBalanceView` watches two inputs, the wallet session's account and
//! the connection provider's client handle. Every change to either input
//! discards the shown balance and issues exactly one lookup for the new
//! pair, or settles on `NoAccount` when no wallet is connected.
//!
//! Lookups run as separate tasks so the view keeps reacting while one is in
//! flight. What happens to a lookup that a newer change supersedes is set by
//! [`SupersedePolicy`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::BalanceState;
use crate::account::{AccountId, Balance, Lamports};
use crate::client::ClientHandle;
use crate::error::LookupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersedePolicy {
    /// Abort the superseded lookup; its result is never applied.
    #[default]
    Cancel,
    /// Let superseded lookups finish and apply results in completion order.
    /// A slow answer for an old account can overwrite a newer one.
    LastWriterWins,
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub supersede: SupersedePolicy,
    /// `None` waits for a lookup forever.
    pub lookup_timeout: Option<Duration>,
}

struct Completion {
    generation: u64,
    account: AccountId,
    result: Result<Lamports, LookupError>,
}

pub struct AccountBalanceView {
    state_rx: watch::Receiver<BalanceState>,
    retry_tx: mpsc::UnboundedSender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    lookups: Arc<AtomicU64>,
    supersede: SupersedePolicy,
}

impl AccountBalanceView {
    /// Start synchronizing. The current values of both inputs are applied
    /// immediately.
    pub fn spawn(
        session_rx: watch::Receiver<Option<AccountId>>,
        connection_rx: watch::Receiver<ClientHandle>,
        options: ViewOptions,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(BalanceState::NoAccount);
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let lookups = Arc::new(AtomicU64::new(0));
        let supersede = options.supersede;

        let sync = Synchronizer {
            session_rx,
            connection_rx,
            state_tx,
            done_tx,
            options,
            lookups: lookups.clone(),
            generation: 0,
            inflight: Vec::new(),
        };
        let task = tokio::spawn(sync.run(retry_rx, done_rx, shutdown_rx));

        Self {
            state_rx,
            retry_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
            lookups,
            supersede,
        }
    }

    pub fn state(&self) -> BalanceState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceState> {
        self.state_rx.clone()
    }

    /// State to show next to `account`, the session's current account.
    ///
    /// The view trails the session by one loop iteration. Under `Cancel` a
    /// state that belongs to another account reads as `Loading` (or
    /// `NoAccount`) until the view catches up. `LastWriterWins` returns the
    /// state unchanged.
    pub fn state_for(&self, account: Option<&AccountId>) -> BalanceState {
        let state = self.state();
        if self.supersede == SupersedePolicy::LastWriterWins || state.account() == account {
            return state;
        }
        match account {
            Some(account) => BalanceState::Loading { account: *account },
            None => BalanceState::NoAccount,
        }
    }

    /// Re-issue the lookup for the current account. No-op when disconnected.
    pub fn retry(&self) {
        let _ = self.retry_tx.send(());
    }

    /// Total lookups issued since the view started.
    pub fn lookups_issued(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Stop the view and abort any lookup still in flight.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AccountBalanceView {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

struct Synchronizer {
    session_rx: watch::Receiver<Option<AccountId>>,
    connection_rx: watch::Receiver<ClientHandle>,
    state_tx: watch::Sender<BalanceState>,
    done_tx: mpsc::UnboundedSender<Completion>,
    options: ViewOptions,
    lookups: Arc<AtomicU64>,
    /// Bumped on every input change or retry; tags each lookup.
    generation: u64,
    inflight: Vec<JoinHandle<()>>,
}

impl Synchronizer {
    async fn run(
        mut self,
        mut retry_rx: mpsc::UnboundedReceiver<()>,
        mut done_rx: mpsc::UnboundedReceiver<Completion>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        self.resync("initial");

        loop {
            tokio::select! {
                changed = self.session_rx.changed() => {
                    if changed.is_err() {
                        debug!("Wallet session closed, stopping balance view");
                        break;
                    }
                    self.resync("account changed");
                }
                changed = self.connection_rx.changed() => {
                    if changed.is_err() {
                        debug!("Connection provider closed, stopping balance view");
                        break;
                    }
                    self.resync("connection replaced");
                }
                Some(()) = retry_rx.recv() => self.retry(),
                Some(done) = done_rx.recv() => self.apply(done),
                _ = &mut shutdown_rx => break,
            }
        }
    }

    fn resync(&mut self, reason: &str) {
        let account = *self.session_rx.borrow_and_update();
        let handle = self.connection_rx.borrow_and_update().clone();
        self.supersede();

        match account {
            None => {
                debug!(reason, "No account connected, balance unknown");
                self.state_tx.send_replace(BalanceState::NoAccount);
            }
            Some(account) => {
                info!(reason, account = %account.short(), endpoint = handle.endpoint(), "Refreshing balance");
                self.state_tx.send_replace(BalanceState::Loading { account });
                self.issue(account, handle);
            }
        }
    }

    fn retry(&mut self) {
        let Some(account) = *self.session_rx.borrow() else {
            debug!("Retry ignored, no account connected");
            return;
        };
        let handle = self.connection_rx.borrow().clone();
        self.supersede();
        info!(account = %account.short(), "Retrying balance lookup");
        self.state_tx.send_replace(BalanceState::Loading { account });
        self.issue(account, handle);
    }

    /// Start a new generation, aborting older lookups under `Cancel`.
    fn supersede(&mut self) {
        self.generation += 1;
        match self.options.supersede {
            SupersedePolicy::Cancel => {
                for task in self.inflight.drain(..) {
                    if !task.is_finished() {
                        debug!("Cancelling superseded balance lookup");
                        task.abort();
                    }
                }
            }
            SupersedePolicy::LastWriterWins => {
                self.inflight.retain(|task| !task.is_finished());
            }
        }
    }

    fn issue(&mut self, account: AccountId, handle: ClientHandle) {
        let generation = self.generation;
        let timeout = self.options.lookup_timeout;
        let done_tx = self.done_tx.clone();
        let client = handle.client;
        let issued = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, issued, account = %account.short(), "Issuing balance lookup");

        let task = tokio::spawn(async move {
            let lookup = client.get_balance(&account);
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, lookup).await {
                    Ok(result) => result,
                    Err(_) => Err(LookupError::Timeout(limit)),
                },
                None => lookup.await,
            };
            let _ = done_tx.send(Completion {
                generation,
                account,
                result,
            });
        });
        self.inflight.push(task);
    }

    fn apply(&mut self, done: Completion) {
        match self.options.supersede {
            SupersedePolicy::Cancel => {
                if done.generation != self.generation {
                    debug!(
                        generation = done.generation,
                        current = self.generation,
                        "Dropping stale balance result"
                    );
                    return;
                }
                // An input change may be queued behind this completion
                if self.inputs_changed() || *self.session_rx.borrow() != Some(done.account) {
                    debug!(
                        account = %done.account.short(),
                        "Dropping balance result, inputs changed"
                    );
                    return;
                }
            }
            SupersedePolicy::LastWriterWins => {
                if self.session_rx.borrow().is_none() {
                    debug!("Dropping balance result, wallet disconnected");
                    return;
                }
                if done.generation != self.generation {
                    warn!(
                        account = %done.account.short(),
                        "Applying superseded balance result (last writer wins)"
                    );
                }
            }
        }

        let next = match done.result {
            Ok(lamports) => {
                let balance = Balance::from_lamports(lamports);
                info!(account = %done.account.short(), "Balance: {}", balance);
                BalanceState::Ready {
                    account: done.account,
                    balance,
                    fetched_at: Utc::now(),
                }
            }
            Err(e) => {
                warn!(account = %done.account.short(), "Balance lookup failed: {}", e);
                BalanceState::Failed {
                    account: done.account,
                    reason: e.to_string(),
                }
            }
        };
        self.state_tx.send_replace(next);
    }

    fn inputs_changed(&self) -> bool {
        self.session_rx.has_changed().unwrap_or(true)
            || self.connection_rx.has_changed().unwrap_or(true)
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        for task in self.inflight.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ConnectionProvider, InMemoryLedger, LedgerClient};
    use crate::session::WalletSession;

    const WAIT: Duration = Duration::from_secs(2);

    fn a1() -> AccountId {
        AccountId::new([1u8; 32])
    }

    fn a2() -> AccountId {
        AccountId::new([2u8; 32])
    }

    struct Harness {
        session: WalletSession,
        ledger: Arc<InMemoryLedger>,
        provider: ConnectionProvider,
        view: AccountBalanceView,
        states: watch::Receiver<BalanceState>,
    }

    fn harness(options: ViewOptions) -> Harness {
        let session = WalletSession::new();
        let ledger = Arc::new(InMemoryLedger::with_balances([
            (a1(), 2_500_000_000),
            (a2(), 7_000_000_000),
        ]));
        let provider = ConnectionProvider::new(ledger.clone());
        let view = AccountBalanceView::spawn(session.subscribe(), provider.subscribe(), options);
        let states = view.subscribe();
        Harness {
            session,
            ledger,
            provider,
            view,
            states,
        }
    }

    async fn wait_until<F>(states: &mut watch::Receiver<BalanceState>, pred: F) -> BalanceState
    where
        F: FnMut(&BalanceState) -> bool,
    {
        tokio::time::timeout(WAIT, states.wait_for(pred))
            .await
            .expect("timed out waiting for balance state")
            .expect("view stopped")
            .clone()
    }

    /// Let spawned tasks run to their next await point.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_no_account_issues_no_lookup() {
        let h = harness(ViewOptions::default());
        settle().await;
        assert_eq!(h.view.state(), BalanceState::NoAccount);
        assert_eq!(h.ledger.calls(), 0);
        assert_eq!(h.view.lookups_issued(), 0);
    }

    #[tokio::test]
    async fn test_connect_shows_balance() {
        let mut h = harness(ViewOptions::default());
        h.session.connect(a1()).unwrap();

        let state = wait_until(&mut h.states, |s| s.is_ready()).await;
        assert_eq!(state.account(), Some(&a1()));
        assert_eq!(state.balance().unwrap().display_amount(), "2.500");
        assert_eq!(h.ledger.calls(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_clears_balance() {
        let mut h = harness(ViewOptions::default());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_ready()).await;

        h.session.disconnect();
        let state = wait_until(&mut h.states, |s| *s == BalanceState::NoAccount).await;
        assert_eq!(state.balance(), None);
    }

    #[tokio::test]
    async fn test_disconnect_while_loading_stays_unknown() {
        let mut h = harness(ViewOptions::default());
        let gate = h.ledger.hold(a1());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_loading()).await;

        h.session.disconnect();
        wait_until(&mut h.states, |s| *s == BalanceState::NoAccount).await;
        gate.release();
        settle().await;
        assert_eq!(h.view.state(), BalanceState::NoAccount);
    }

    #[tokio::test]
    async fn test_switch_resets_before_new_result() {
        let mut h = harness(ViewOptions::default());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_ready()).await;

        let gate = h.ledger.hold(a2());
        h.session.switch(a2()).unwrap();

        // Old balance is gone before the new lookup answers
        let state = wait_until(&mut h.states, |s| !s.is_ready()).await;
        assert_eq!(state, BalanceState::Loading { account: a2() });
        settle().await;
        assert_eq!(h.view.state(), BalanceState::Loading { account: a2() });

        gate.release();
        let state = wait_until(&mut h.states, |s| s.is_ready()).await;
        assert_eq!(state.account(), Some(&a2()));
        assert_eq!(state.balance().unwrap().display_amount(), "7.000");
    }

    #[tokio::test]
    async fn test_cancel_drops_stale_result() {
        let mut h = harness(ViewOptions::default());
        let gate_a1 = h.ledger.hold(a1());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_loading()).await;

        h.session.switch(a2()).unwrap();
        let state = wait_until(&mut h.states, |s| s.is_ready()).await;
        assert_eq!(state.account(), Some(&a2()));

        // The a1 lookup was aborted; releasing its gate changes nothing
        gate_a1.release();
        settle().await;
        assert_eq!(h.view.state().account(), Some(&a2()));
        assert_eq!(h.view.state().balance().unwrap().display_amount(), "7.000");
    }

    #[tokio::test]
    async fn test_last_writer_wins_race() {
        let mut h = harness(ViewOptions {
            supersede: SupersedePolicy::LastWriterWins,
            lookup_timeout: None,
        });
        let gate_a1 = h.ledger.hold(a1());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_loading()).await;

        h.session.switch(a2()).unwrap();
        wait_until(&mut h.states, |s| s.is_ready()).await;

        // a1 resolves last in wall-clock order and overwrites a2's balance
        gate_a1.release();
        let state = wait_until(&mut h.states, |s| s.account() == Some(&a1())).await;
        assert_eq!(state.balance().unwrap().display_amount(), "2.500");
        assert_eq!(h.session.current(), Some(a2()));
    }

    #[tokio::test]
    async fn test_last_writer_wins_disconnect_stays_unknown() {
        let mut h = harness(ViewOptions {
            supersede: SupersedePolicy::LastWriterWins,
            lookup_timeout: None,
        });
        let gate = h.ledger.hold(a1());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_loading()).await;

        h.session.disconnect();
        wait_until(&mut h.states, |s| *s == BalanceState::NoAccount).await;
        gate.release();
        settle().await;
        assert_eq!(h.view.state(), BalanceState::NoAccount);
        assert_eq!(h.ledger.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_drops_result_when_switch_is_queued() {
        let session = WalletSession::new();
        let ledger = Arc::new(InMemoryLedger::new());
        let _gate = ledger.hold(a1());
        let provider = ConnectionProvider::new(ledger.clone());
        let (state_tx, state_rx) = watch::channel(BalanceState::NoAccount);
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let mut sync = Synchronizer {
            session_rx: session.subscribe(),
            connection_rx: provider.subscribe(),
            state_tx,
            done_tx,
            options: ViewOptions::default(),
            lookups: Arc::new(AtomicU64::new(0)),
            generation: 0,
            inflight: Vec::new(),
        };

        session.connect(a1()).unwrap();
        sync.resync("account changed");
        assert_eq!(*state_rx.borrow(), BalanceState::Loading { account: a1() });

        // a1 answered for the current generation, but the switch is not handled yet
        session.switch(a2()).unwrap();
        sync.apply(Completion {
            generation: sync.generation,
            account: a1(),
            result: Ok(2_500_000_000),
        });
        assert_eq!(*state_rx.borrow(), BalanceState::Loading { account: a1() });

        sync.resync("account changed");
        assert_eq!(*state_rx.borrow(), BalanceState::Loading { account: a2() });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_switch_racing_completion_never_shows_old_balance() {
        for _ in 0..50 {
            let mut h = harness(ViewOptions::default());
            let gate = h.ledger.hold(a1());
            h.session.connect(a1()).unwrap();
            wait_until(&mut h.states, |s| s.is_loading()).await;

            gate.release();
            tokio::task::yield_now().await;
            h.session.switch(a2()).unwrap();

            let current = h.session.current();
            let shown = h.view.state_for(current.as_ref());
            assert_ne!(shown.account(), Some(&a1()), "{:?}", shown);

            let state = wait_until(&mut h.states, |s| {
                s.is_ready() && s.account() == Some(&a2())
            })
            .await;
            assert_eq!(state.balance().unwrap().display_amount(), "7.000");
            settle().await;
            assert_eq!(h.view.state().account(), Some(&a2()));
        }
    }

    #[tokio::test]
    async fn test_state_for_follows_policy() {
        let mut h = harness(ViewOptions::default());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_ready()).await;

        assert!(h.view.state_for(Some(&a1())).is_ready());
        assert_eq!(
            h.view.state_for(Some(&a2())),
            BalanceState::Loading { account: a2() }
        );
        assert_eq!(h.view.state_for(None), BalanceState::NoAccount);

        let mut lww = harness(ViewOptions {
            supersede: SupersedePolicy::LastWriterWins,
            lookup_timeout: None,
        });
        lww.session.connect(a1()).unwrap();
        wait_until(&mut lww.states, |s| s.is_ready()).await;
        assert_eq!(lww.view.state_for(Some(&a2())).account(), Some(&a1()));
    }

    #[tokio::test]
    async fn test_pending_lookup_stays_loading() {
        let mut h = harness(ViewOptions::default());
        h.ledger.hang(a1());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_loading()).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.view.state(), BalanceState::Loading { account: a1() });
    }

    #[tokio::test]
    async fn test_lookup_timeout_fails() {
        let mut h = harness(ViewOptions {
            supersede: SupersedePolicy::Cancel,
            lookup_timeout: Some(Duration::from_millis(50)),
        });
        h.ledger.hang(a1());
        h.session.connect(a1()).unwrap();

        let state = wait_until(&mut h.states, |s| s.is_failed()).await;
        match state {
            BalanceState::Failed { account, reason } => {
                assert_eq!(account, a1());
                assert!(reason.contains("timed out"), "{}", reason);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let mut h = harness(ViewOptions::default());
        h.ledger.fail(a1(), "connection reset");
        h.session.connect(a1()).unwrap();

        let state = wait_until(&mut h.states, |s| s.is_failed()).await;
        assert_eq!(
            state,
            BalanceState::Failed {
                account: a1(),
                reason: "Ledger unavailable: connection reset".to_string()
            }
        );

        h.ledger.clear_failure(&a1());
        h.view.retry();
        let state = wait_until(&mut h.states, |s| s.is_ready()).await;
        assert_eq!(state.balance().unwrap().display_amount(), "2.500");
        assert_eq!(h.ledger.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_without_account_is_noop() {
        let h = harness(ViewOptions::default());
        h.view.retry();
        settle().await;
        assert_eq!(h.view.state(), BalanceState::NoAccount);
        assert_eq!(h.view.lookups_issued(), 0);
    }

    #[tokio::test]
    async fn test_new_connection_refetches_same_account() {
        let mut h = harness(ViewOptions::default());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_ready()).await;

        let mainnet = Arc::new(InMemoryLedger::with_balances([(a1(), 42_000_000)]));
        h.provider.replace(mainnet.clone() as Arc<dyn LedgerClient>);

        let state = wait_until(&mut h.states, |s| {
            s.balance().map(|b| b.lamports()) == Some(42_000_000)
        })
        .await;
        assert_eq!(state.balance().unwrap().display_amount(), "0.042");
        assert_eq!(mainnet.calls(), 1);
        assert_eq!(h.view.lookups_issued(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_inflight() {
        let mut h = harness(ViewOptions::default());
        h.ledger.hang(a1());
        h.session.connect(a1()).unwrap();
        wait_until(&mut h.states, |s| s.is_loading()).await;

        h.view.shutdown().await;
        // Sender side is gone once the task has stopped
        assert!(h.states.changed().await.is_err());
    }
}
