//! RPC gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Keypair files (JSON byte arrays)
//!     → wallet.rs (key loading, signing, seeded address derivation)
//!     → transaction.rs (compile, sign, serialize)
//!     → gateway.rs (JSON-RPC submission, polling, snapshots)
//! ```
//!
//! # Design Decisions
//! - Every RPC call has a deadline; exhausting it is an error, not a hang
//! - Workflow tasks depend on the Gateway trait, never on reqwest directly
//! - Keys are never logged or serialized

pub mod gateway;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use gateway::{Gateway, HttpGateway};
pub use types::{Blockhash, Pubkey, RecentBlockhash, RpcError, TransactionStatus};
pub use wallet::Wallet;
