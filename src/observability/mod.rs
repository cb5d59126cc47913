//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All tasks produce:
//!     → tracing events (structured fields, EnvFilter-controlled)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap (atomic); safe to call on every merge
//! - Latency histograms carry wall-clock deltas; control flow never does

pub mod metrics;
