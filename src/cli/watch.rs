//! Interactive wallet session.
//!
//! Reads commands from stdin, drives the wallet session and connection
//! provider, and re-renders the balance card whenever the view changes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::{ledger_client, resolve_cluster};
use crate::account::{AccountId, Lamports, LAMPORTS_PER_SOL};
use crate::client::{Cluster, ConnectionProvider, InMemoryLedger, LedgerClient};
use crate::config::ConnectorConfig;
use crate::error::ConnectorError;
use crate::session::WalletSession;
use crate::view::{render_card, AccountBalanceView, Theme};

const HELP: &str = "\
Commands:
  connect <address>   connect a wallet
  switch <address>    switch to another account
  disconnect          disconnect the wallet
  cluster <name|url>  change endpoint (devnet, testnet, mainnet-beta, URL)
  retry               re-issue the balance lookup
  theme               toggle light/dark
  airdrop <sol>       set the balance of the connected account (offline only)
  help                show this help
  quit                exit";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Connect(AccountId),
    Switch(AccountId),
    Disconnect,
    Cluster(Cluster),
    Retry,
    Theme,
    Airdrop(Lamports),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("Too many arguments for '{}'", verb));
    }

    let require = |what: &str| arg.ok_or_else(|| format!("Usage: {} <{}>", verb, what));
    let account = |s: &str| s.parse::<AccountId>().map_err(|e| e.to_string());

    match verb.as_str() {
        "connect" => Ok(SessionCommand::Connect(account(require("address")?)?)),
        "switch" => Ok(SessionCommand::Switch(account(require("address")?)?)),
        "disconnect" => Ok(SessionCommand::Disconnect),
        "cluster" => require("name|url")?
            .parse::<Cluster>()
            .map(SessionCommand::Cluster)
            .map_err(|e| e.to_string()),
        "retry" | "refresh" => Ok(SessionCommand::Retry),
        "theme" => Ok(SessionCommand::Theme),
        "airdrop" => parse_sol(require("sol")?).map(SessionCommand::Airdrop),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" => Ok(SessionCommand::Quit),
        "" => Err("Empty command".to_string()),
        other => Err(format!("Unknown command '{}' (type 'help')", other)),
    }
}

/// Display units to native units, truncating below one lamport.
fn parse_sol(s: &str) -> Result<Lamports, String> {
    let amount: Decimal = s.parse().map_err(|_| format!("Invalid amount: {}", s))?;
    if amount.is_sign_negative() {
        return Err(format!("Invalid amount: {}", s));
    }
    (amount * Decimal::from(LAMPORTS_PER_SOL))
        .trunc()
        .to_u64()
        .ok_or_else(|| format!("Amount out of range: {}", s))
}

struct WatchSession {
    config: ConnectorConfig,
    session: WalletSession,
    provider: ConnectionProvider,
    view: AccountBalanceView,
    theme: Theme,
    /// Present only in offline mode.
    offline: Option<Arc<InMemoryLedger>>,
}

impl WatchSession {
    fn render(&self) {
        let account = self.session.current();
        let state = self.view.state_for(account.as_ref());
        println!("{}", render_card(&self.theme, account.as_ref(), &state));
    }

    /// Returns false when the session should end.
    fn execute(&mut self, command: SessionCommand) -> Result<bool, ConnectorError> {
        match command {
            SessionCommand::Connect(account) => self.session.connect(account)?,
            SessionCommand::Switch(account) => self.session.switch(account)?,
            SessionCommand::Disconnect => self.session.disconnect(),
            SessionCommand::Cluster(cluster) => {
                let client: Arc<dyn LedgerClient> = match &self.offline {
                    Some(ledger) => ledger.clone() as Arc<dyn LedgerClient>,
                    None => ledger_client(&self.config, &cluster)?,
                };
                self.provider.replace(client);
            }
            SessionCommand::Retry => self.view.retry(),
            SessionCommand::Theme => {
                self.theme.toggle();
                self.render();
            }
            SessionCommand::Airdrop(lamports) => match (&self.offline, self.session.current()) {
                (Some(ledger), Some(account)) => {
                    ledger.set_balance(account, lamports);
                    self.view.retry();
                }
                (None, _) => println!("airdrop is only available with --offline"),
                (_, None) => println!("Connect a wallet first"),
            },
            SessionCommand::Help => println!("{}", HELP),
            SessionCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Remember the connected account for the next start.
    fn remember_account(&mut self, path: &Path) {
        if !self.config.wallet.auto_connect {
            return;
        }
        let Some(account) = self.session.current() else {
            return;
        };
        if self.config.wallet.last_account == Some(account) {
            return;
        }
        self.config.wallet.last_account = Some(account);
        match self.config.save(path) {
            Ok(()) => info!("Remembered account {} in {}", account.short(), path.display()),
            Err(e) => warn!("Could not save config: {}", e),
        }
    }
}

pub async fn handle_watch_command(
    config: ConnectorConfig,
    config_path: &Path,
    account: Option<&str>,
    cluster: Option<&str>,
    offline: bool,
) -> Result<(), ConnectorError> {
    let start_account = match account {
        Some(address) => Some(address.parse::<AccountId>()?),
        None => config.auto_connect_account(),
    };
    let theme = config.theme()?;

    let (client, offline): (Arc<dyn LedgerClient>, Option<Arc<InMemoryLedger>>) = if offline {
        let ledger = Arc::new(InMemoryLedger::new());
        let client: Arc<dyn LedgerClient> = ledger.clone();
        (client, Some(ledger))
    } else {
        let cluster = resolve_cluster(&config, cluster)?;
        (ledger_client(&config, &cluster)?, None)
    };

    let session = WalletSession::new();
    let provider = ConnectionProvider::new(client);
    let view = AccountBalanceView::spawn(
        session.subscribe(),
        provider.subscribe(),
        config.view_options(),
    );
    let mut states = view.subscribe();

    let mut watch = WatchSession {
        config,
        session,
        provider,
        view,
        theme,
        offline,
    };
    watch.session.auto_connect(start_account)?;
    watch.render();
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let keep_going = match parse_command(&line) {
                    Ok(command) => watch.execute(command).unwrap_or_else(|e| {
                        println!("error: {}", e);
                        true
                    }),
                    Err(message) => {
                        println!("{}", message);
                        true
                    }
                };
                if !keep_going {
                    break;
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                states.borrow_and_update();
                watch.render();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    watch.remember_account(config_path);
    watch.view.shutdown().await;
    Ok(())
}
