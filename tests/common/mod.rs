//! Shared utilities for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use counter_watch::codec::AccountEnvelope;
use counter_watch::rpc::gateway::Gateway;
use counter_watch::rpc::transaction::SignedTransaction;
use counter_watch::rpc::types::{
    Blockhash, Pubkey, RecentBlockhash, RpcError, RpcResult, TransactionStatus,
};
use counter_watch::rpc::Wallet;

/// Deterministic test keypair.
pub fn wallet(fill: u8) -> Wallet {
    let signing = SigningKey::from_bytes(&[fill; 32]);
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(&signing.to_bytes());
    bytes.extend_from_slice(&signing.verifying_key().to_bytes());
    Wallet::from_bytes(&bytes).unwrap()
}

/// Encode a counter account's fixed layout.
pub fn counter_account_bytes(counter: u32, block_timestamp: i64, client_timestamp: i64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(20);
    bytes.extend_from_slice(&counter.to_le_bytes());
    bytes.extend_from_slice(&block_timestamp.to_le_bytes());
    bytes.extend_from_slice(&client_timestamp.to_le_bytes());
    bytes
}

pub fn data_envelope(data: Vec<u8>) -> AccountEnvelope {
    AccountEnvelope {
        slot: 100,
        lamports: 1_000_000,
        executable: false,
        data,
    }
}

pub fn program_envelope() -> AccountEnvelope {
    AccountEnvelope {
        slot: 100,
        lamports: 1_141_440,
        executable: true,
        data: Vec::new(),
    }
}

/// Scripted [`Gateway`] standing in for a node.
#[derive(Default)]
pub struct MockGateway {
    /// Status replies consumed in order; empty means `NotFound`.
    pub statuses: Mutex<VecDeque<TransactionStatus>>,
    /// When false, submissions fail with a node error.
    pub accept_submissions: bool,
    /// Submitted transaction ids, in order.
    pub submissions: Mutex<Vec<String>>,
    /// Accounts by base58 address.
    pub accounts: Mutex<HashMap<String, AccountEnvelope>>,
    /// Address that springs into existence on the next submission
    /// (models data-account creation landing).
    pub create_on_submit: Option<(String, AccountEnvelope)>,
    /// Funding requests observed, as (address, lamports).
    pub funding_requests: Mutex<Vec<(String, u64)>>,
    pub balance: u64,
    pub rent_exemption: u64,
    pub fee_per_signature: u64,
}

impl MockGateway {
    pub fn accepting() -> Self {
        Self {
            accept_submissions: true,
            balance: 10_000_000,
            rent_exemption: 1_000_000,
            fee_per_signature: 5_000,
            ..Self::default()
        }
    }

    pub fn with_account(self, address: &Pubkey, envelope: AccountEnvelope) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(address.to_string(), envelope);
        self
    }

    pub fn with_statuses(self, statuses: Vec<TransactionStatus>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn submit_transaction(&self, tx: &SignedTransaction) -> RpcResult<String> {
        if !self.accept_submissions {
            return Err(RpcError::Node {
                code: -32002,
                message: "Transaction simulation failed".to_string(),
            });
        }
        let id = tx.id();
        self.submissions.lock().unwrap().push(id.clone());
        if let Some((address, envelope)) = &self.create_on_submit {
            self.accounts
                .lock()
                .unwrap()
                .insert(address.clone(), envelope.clone());
        }
        Ok(id)
    }

    async fn get_transaction_status(&self, _txn_id: &str) -> RpcResult<TransactionStatus> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TransactionStatus::NotFound))
    }

    async fn get_account_snapshot(&self, address: &Pubkey) -> RpcResult<Option<AccountEnvelope>> {
        Ok(self.accounts.lock().unwrap().get(&address.to_string()).cloned())
    }

    async fn request_funding(&self, address: &Pubkey, lamports: u64) -> RpcResult<String> {
        self.funding_requests
            .lock()
            .unwrap()
            .push((address.to_string(), lamports));
        Ok("airdrop-sig".to_string())
    }

    async fn get_recent_blockhash(&self) -> RpcResult<RecentBlockhash> {
        Ok(RecentBlockhash {
            blockhash: Blockhash([7u8; 32]),
            fee_per_signature: self.fee_per_signature,
        })
    }

    async fn get_balance(&self, _address: &Pubkey) -> RpcResult<u64> {
        Ok(self.balance)
    }

    async fn get_rent_exemption(&self, _data_len: usize) -> RpcResult<u64> {
        Ok(self.rent_exemption)
    }
}
