use std::time::Duration;
use thiserror::Error;

use crate::account::AccountId;

/// Failure of a single balance lookup against a ledger endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("RPC request failed: {0}")]
    Transport(String),
    #[error("RPC endpoint returned HTTP {0}")]
    Status(u16),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid base58 address: {0}")]
    InvalidBase58(String),
    #[error("Invalid public key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Wallet already connected as {0}")]
    AlreadyConnected(AccountId),
    #[error("No wallet connected")]
    NotConnected,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Error serializing config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unknown cluster '{0}' (expected devnet, testnet, mainnet-beta or an http(s) URL)")]
    InvalidCluster(String),
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    AccountId(#[from] AccountIdError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
