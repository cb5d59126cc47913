//! Wire codec for the counter program's on-chain state.
//!
//! # Data Flow
//! ```text
//! JSON-RPC response / WS notification
//!     → envelope.rs (structural validation, base64 decode)
//!     → layout.rs (fixed-layout decode into CounterAccountSnapshot)
//! ```
//!
//! # Design Decisions
//! - Decoding is two composable pure stages; no state, no I/O
//! - A decode failure is fatal only to the message being decoded
//! - All on-chain integers are little-endian

pub mod envelope;
pub mod layout;

pub use envelope::{parse_account_envelope, AccountEnvelope, CodecError};
pub use layout::{decode_counter_account, CounterAccountSnapshot, COUNTER_ACCOUNT_LEN};
