// RPC client for making JSON-RPC requests against a ledger endpoint
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::cluster::Commitment;
use super::LedgerClient;
use crate::account::{AccountId, Lamports};
use crate::error::LookupError;

pub struct RpcClient {
    url: String,
    client: Client,
    commitment: Commitment,
    timeout: Duration,
    request_id: AtomicU64,
}

/// `{"context": {"slot": n}, "value": ...}` wrapper used by most ledger reads.
/// Only the value is kept.
#[derive(Deserialize, Debug)]
struct ContextValue<T> {
    value: T,
}

#[derive(Deserialize, Debug)]
struct VersionInfo {
    #[serde(rename = "solana-core")]
    solana_core: String,
}

impl RpcClient {
    pub fn new(url: String) -> Result<Self, LookupError> {
        Self::with_options(url, Commitment::default(), Duration::from_secs(10))
    }

    pub fn with_options(
        url: String,
        commitment: Commitment,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url,
            client,
            commitment,
            timeout,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw balance of `account` in native units.
    pub async fn get_balance(&self, account: &AccountId) -> Result<Lamports, LookupError> {
        let params = json!([
            account.to_base58(),
            { "commitment": self.commitment.as_str() }
        ]);
        let result = self.send_request("getBalance", params).await?;
        let balance: ContextValue<u64> = serde_json::from_value(result)
            .map_err(|e| LookupError::MalformedResponse(format!("getBalance: {}", e)))?;
        Ok(balance.value)
    }

    /// Node software version reported by the endpoint.
    pub async fn get_version(&self) -> Result<String, LookupError> {
        let result = self.send_request("getVersion", json!(null)).await?;
        let info: VersionInfo = serde_json::from_value(result)
            .map_err(|e| LookupError::MalformedResponse(format!("getVersion: {}", e)))?;
        Ok(info.solana_core)
    }

    // Helper for sending requests
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, LookupError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let mut request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "id": id,
        });
        if !params.is_null() {
            request["params"] = params;
        }

        debug!(method, id, url = %self.url, "sending RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let mut json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout(self.timeout)
                } else {
                    LookupError::MalformedResponse(format!("Failed to parse response: {}", e))
                }
            })?;

        if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
            return Err(LookupError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"].as_str().unwrap_or("Unknown error").to_string(),
            });
        }

        match json.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(LookupError::MalformedResponse(
                "response has neither result nor error".to_string(),
            )),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout(self.timeout)
        } else {
            LookupError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn get_balance(&self, account: &AccountId) -> Result<Lamports, LookupError> {
        RpcClient::get_balance(self, account).await
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
