//! Resilience subsystem.
//!
//! # Design Decisions
//! - Every RPC call and confirmation poll has a deadline
//! - The action loop does not retry failed submissions immediately; its own
//!   cadence is the retry
//! - Subscription reconnects back off exponentially with jitter

pub mod backoff;

pub use backoff::calculate_backoff;
