//! Counter transaction lifecycle client library.

pub mod codec;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod reconcile;
pub mod resilience;
pub mod rpc;
pub mod workflow;

pub use config::ClientConfig;
pub use lifecycle::Shutdown;
pub use reconcile::{Janitor, ProcessingRecord, ReconcileTable};
