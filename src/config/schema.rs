//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files; every
//! field has a default so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the counter client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Node endpoints and call deadlines.
    pub rpc: RpcConfig,

    /// Keypair file locations.
    pub keys: KeyConfig,

    /// Action loop cadence and limits.
    pub action: ActionConfig,

    /// Reconciliation table sweeping.
    pub reconcile: ReconcileConfig,

    /// Metrics exposition.
    pub observability: ObservabilityConfig,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// HTTP JSON-RPC endpoint.
    pub http_url: String,

    /// WebSocket endpoint for account subscriptions.
    pub ws_url: String,

    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,

    /// Commitment level for queries ("processed", "confirmed", "finalized").
    pub commitment: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            http_url: "http://127.0.0.1:8899".to_string(),
            ws_url: "ws://127.0.0.1:8900".to_string(),
            request_timeout_secs: 10,
            commitment: "confirmed".to_string(),
        }
    }
}

/// Keypair file locations (JSON byte-array format).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Funding/fee-payer keypair.
    pub keypair_path: String,

    /// Counter program keypair.
    pub program_keypair_path: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            keypair_path: format!("{home}/.config/solana/id.json"),
            program_keypair_path: std::env::var("PROGRAM_KEYPAIR").unwrap_or_default(),
        }
    }
}

/// Action loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Number of increment iterations to run.
    pub iterations: u32,

    /// Sleep between iterations in seconds.
    pub sleep_secs: u64,

    /// Deadline for a transaction to confirm, in seconds.
    pub confirm_timeout_secs: u64,

    /// Status poll cadence in milliseconds.
    pub poll_interval_ms: u64,

    /// Create the seeded data account at startup when missing.
    pub create_data_account: bool,

    /// Provider tag distinguishing this producer in record identities.
    pub provider: String,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            iterations: 19,
            sleep_secs: 10,
            confirm_timeout_secs: 30,
            poll_interval_ms: 500,
            create_data_account: true,
            provider: "onering".to_string(),
        }
    }
}

/// Reconciliation table sweeping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Janitor tick period in seconds.
    pub janitor_interval_secs: u64,

    /// Evict records not updated within this many seconds.
    pub stale_after_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            janitor_interval_secs: 10,
            stale_after_secs: 60,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
