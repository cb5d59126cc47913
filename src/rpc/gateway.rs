//! JSON-RPC gateway to the node.
//!
//! # Responsibilities
//! - Submit signed transactions and poll their status
//! - Fetch account snapshots and fee/rent parameters
//! - Request funding top-ups (airdrops)
//! - Enforce a deadline on every call
//!
//! The [`Gateway`] trait is the seam the workflow tasks depend on; tests
//! drive them with a scripted implementation instead of a node.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;

use crate::codec::{parse_account_envelope, AccountEnvelope};
use crate::config::RpcConfig;
use crate::rpc::transaction::SignedTransaction;
use crate::rpc::types::{Blockhash, Pubkey, RecentBlockhash, RpcError, RpcResult, TransactionStatus};

/// Abstract node operations consumed by the workflow tasks.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Submit a signed transaction, returning the network-assigned id.
    async fn submit_transaction(&self, tx: &SignedTransaction) -> RpcResult<String>;

    /// Look up a submitted transaction.
    async fn get_transaction_status(&self, txn_id: &str) -> RpcResult<TransactionStatus>;

    /// Fetch an account observation; `None` when the account does not exist.
    async fn get_account_snapshot(&self, address: &Pubkey) -> RpcResult<Option<AccountEnvelope>>;

    /// Ask the network to top up an account's balance.
    async fn request_funding(&self, address: &Pubkey, lamports: u64) -> RpcResult<String>;

    /// Fetch a recent blockhash and the per-signature fee against it.
    async fn get_recent_blockhash(&self) -> RpcResult<RecentBlockhash>;

    /// Current balance of an account in lamports.
    async fn get_balance(&self, address: &Pubkey) -> RpcResult<u64>;

    /// Minimum balance making an account of `data_len` bytes rent-exempt.
    async fn get_rent_exemption(&self, data_len: usize) -> RpcResult<u64>;
}

/// [`Gateway`] implementation over HTTP JSON-RPC 2.0.
pub struct HttpGateway {
    http: reqwest::Client,
    url: String,
    commitment: String,
    timeout_secs: u64,
    next_id: AtomicU64,
}

impl HttpGateway {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.http_url.clone(),
            commitment: config.commitment.clone(),
            timeout_secs: config.request_timeout_secs,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let request = self.http.post(&self.url).json(&body).send();
        let response = timeout(Duration::from_secs(self.timeout_secs), request)
            .await
            .map_err(|_| RpcError::Timeout(self.timeout_secs))??;
        let payload: Value = timeout(Duration::from_secs(self.timeout_secs), response.json())
            .await
            .map_err(|_| RpcError::Timeout(self.timeout_secs))??;

        if let Some(error) = payload.get("error") {
            return Err(RpcError::Node {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::Malformed(format!("{method} response has no result field")))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn submit_transaction(&self, tx: &SignedTransaction) -> RpcResult<String> {
        let result = self
            .call(
                "sendTransaction",
                json!([tx.to_base64(), { "encoding": "base64" }]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::Malformed("sendTransaction result is not a string".into()))
    }

    async fn get_transaction_status(&self, txn_id: &str) -> RpcResult<TransactionStatus> {
        let result = self
            .call(
                "getTransaction",
                json!([txn_id, { "commitment": self.commitment }]),
            )
            .await?;
        if result.is_null() {
            return Ok(TransactionStatus::NotFound);
        }
        match result.get("blockTime").and_then(Value::as_i64) {
            Some(block_time) => Ok(TransactionStatus::Confirmed {
                block_time: Some(block_time),
            }),
            None => Ok(TransactionStatus::Pending),
        }
    }

    async fn get_account_snapshot(&self, address: &Pubkey) -> RpcResult<Option<AccountEnvelope>> {
        let result = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;
        if result.pointer("/value").map(Value::is_null).unwrap_or(true) {
            return Ok(None);
        }
        Ok(Some(parse_account_envelope(&result)?))
    }

    async fn request_funding(&self, address: &Pubkey, lamports: u64) -> RpcResult<String> {
        let result = self
            .call("requestAirdrop", json!([address.to_string(), lamports]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::Malformed("requestAirdrop result is not a string".into()))
    }

    async fn get_recent_blockhash(&self) -> RpcResult<RecentBlockhash> {
        let result = self.call("getRecentBlockhash", json!([])).await?;
        let blockhash: Blockhash = result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::Malformed("missing value.blockhash".into()))?
            .parse()?;
        let fee_per_signature = result
            .pointer("/value/feeCalculator/lamportsPerSignature")
            .and_then(Value::as_u64)
            .ok_or_else(|| RpcError::Malformed("missing value.feeCalculator".into()))?;
        Ok(RecentBlockhash {
            blockhash,
            fee_per_signature,
        })
    }

    async fn get_balance(&self, address: &Pubkey) -> RpcResult<u64> {
        let result = self
            .call("getBalance", json!([address.to_string()]))
            .await?;
        result
            .pointer("/value")
            .and_then(Value::as_u64)
            .ok_or_else(|| RpcError::Malformed("getBalance result has no value".into()))
    }

    async fn get_rent_exemption(&self, data_len: usize) -> RpcResult<u64> {
        let result = self
            .call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await?;
        result
            .as_u64()
            .ok_or_else(|| RpcError::Malformed("rent exemption result is not a number".into()))
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("url", &self.url)
            .field("commitment", &self.commitment)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
