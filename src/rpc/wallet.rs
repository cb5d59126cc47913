//! Keypair loading and message signing.
//!
//! Keypairs are the standard 64-byte JSON array file (`id.json`): the first
//! 32 bytes are the ed25519 secret, the last 32 the public key. Keys are
//! never logged.

use ed25519_dalek::{Signer, SigningKey};
use std::path::Path;
use thiserror::Error;

use crate::rpc::types::Pubkey;

/// Seed string for the program's derived data account.
pub const DERIVED_ADDRESS_SEED: &str = "HELLOWORLD";

/// Errors raised while loading a keypair file.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("cannot read keypair file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("keypair file is not a JSON byte array: {0}")]
    Json(#[from] serde_json::Error),

    #[error("keypair file holds {0} bytes, expected 64")]
    BadLength(usize),
}

/// An ed25519 keypair able to sign transaction messages.
pub struct Wallet {
    signing: SigningKey,
    pubkey: Pubkey,
}

impl Wallet {
    /// Load a keypair from a JSON byte-array file.
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        let raw = std::fs::read_to_string(path).map_err(|source| WalletError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&raw)?;
        Self::from_bytes(&bytes)
    }

    /// Build a wallet from the 64-byte secret+public representation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        if bytes.len() != 64 {
            return Err(WalletError::BadLength(bytes.len()));
        }
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&bytes[..32]);
        let signing = SigningKey::from_bytes(&secret);
        let pubkey = Pubkey(signing.verifying_key().to_bytes());
        Ok(Self { signing, pubkey })
    }

    /// The wallet's public key.
    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    /// Sign a serialized transaction message.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("pubkey", &self.pubkey).finish()
    }
}

/// Address of the counter program's data account for a given funding key.
pub fn data_account_address(base: &Pubkey, program: &Pubkey) -> Pubkey {
    Pubkey::create_with_seed(base, DERIVED_ADDRESS_SEED, program)
}
