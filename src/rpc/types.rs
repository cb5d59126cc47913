//! RPC-facing types and error definitions.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::CodecError;

/// A 32-byte account address, displayed in base58.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    /// The system program address (all zero bytes).
    pub const fn system_program() -> Self {
        Pubkey([0u8; 32])
    }

    /// Derive an address from a base key, a seed string and an owning
    /// program: `sha256(base ++ seed ++ owner)`.
    ///
    /// Deterministic, so the subscription target can be re-derived after a
    /// reconnect without any server-side state.
    pub fn create_with_seed(base: &Pubkey, seed: &str, owner: &Pubkey) -> Pubkey {
        let mut hasher = Sha256::new();
        hasher.update(base.0);
        hasher.update(seed.as_bytes());
        hasher.update(owner.0);
        Pubkey(hasher.finalize().into())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl FromStr for Pubkey {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| RpcError::Malformed(format!("invalid base58 address '{s}': {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| RpcError::Malformed(format!("address has {} bytes", v.len())))?;
        Ok(Pubkey(bytes))
    }
}

/// A recent blockhash used to anchor a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blockhash(pub [u8; 32]);

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl FromStr for Blockhash {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| RpcError::Malformed(format!("invalid base58 blockhash '{s}': {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| RpcError::Malformed(format!("blockhash has {} bytes", v.len())))?;
        Ok(Blockhash(bytes))
    }
}

/// Blockhash plus the fee a single signature costs against it.
#[derive(Debug, Clone, Copy)]
pub struct RecentBlockhash {
    pub blockhash: Blockhash,
    pub fee_per_signature: u64,
}

/// Errors that can occur during RPC operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP transport failure (connect, send, body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not complete within the configured deadline.
    #[error("RPC request timed out after {0} seconds")]
    Timeout(u64),

    /// The node returned a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    /// The response did not have the expected shape.
    #[error("malformed RPC response: {0}")]
    Malformed(String),

    /// Account payload failed envelope or layout decoding.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Network-reported state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// The node has not located the transaction yet.
    NotFound,
    /// The transaction is known but has no block timestamp yet.
    Pending,
    /// The transaction landed; `block_time` is the block's unix timestamp
    /// when the node reports one.
    Confirmed { block_time: Option<i64> },
}
