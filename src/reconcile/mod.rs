//! Reconciliation core.
//!
//! # Data Flow
//! ```text
//! Action loop ──┐
//!               ├─→ table.rs (upsert_merge, keyed by record identity)
//! WS listener ──┘         │
//!                         ▼
//!               janitor.rs (report latencies, evict complete & stale)
//! ```
//!
//! # Design Decisions
//! - The table is the only shared mutable state in the process
//! - Merge is the sole synchronization between the two channels; either
//!   one may observe a logical transaction first
//! - Staleness uses the monotonic clock; wall time is for metrics only

pub mod janitor;
pub mod record;
pub mod table;

pub use janitor::Janitor;
pub use record::ProcessingRecord;
pub use table::ReconcileTable;
