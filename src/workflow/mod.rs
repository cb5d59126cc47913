//! Long-running workflow tasks.
//!
//! # Data Flow
//! ```text
//! prepare.rs (once, at startup)
//!     → verifies program, funds payer, creates data account
//!
//! action.rs ────────────┐
//!     submit + poll     ├─→ ReconcileTable
//! listener.rs ──────────┘
//!     accountSubscribe stream
//! ```
//!
//! The two producers never talk to each other; the table's merge is their
//! only synchronization.

pub mod action;
pub mod listener;
pub mod prepare;

pub use action::ActionLoop;
pub use listener::AccountListener;
pub use prepare::{prepare, PrepareError};
