//! Transaction lifecycle records and their merge semantics.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Far-future sentinel (9999-12-31T23:59:59Z) marking a field the poll
/// deadline exhausted before the network answered. Distinguishes
/// "undetermined" from "never attempted" (`None`).
pub const UNDETERMINED_SECS: u64 = 253_402_300_799;

/// The sentinel as a [`SystemTime`].
pub fn undetermined() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(UNDETERMINED_SECS)
}

/// Whether a timestamp is the undetermined sentinel.
pub fn is_undetermined(t: SystemTime) -> bool {
    t == undetermined()
}

/// Wall-clock timestamp truncated to whole unix seconds.
pub fn unix_secs(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Unix seconds back to a wall-clock timestamp.
pub fn from_unix_secs(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

/// Elapsed seconds between two wall-clock timestamps, zero when the clock
/// ran backwards. Used for human-readable latency only, never for control
/// flow.
pub fn delta_secs(start: SystemTime, end: SystemTime) -> f64 {
    end.duration_since(start)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One logical transaction's lifecycle state, assembled from the action
/// loop and the subscription listener.
///
/// `client_time_secs` plus `provider` form the record's identity; the two
/// channels observe the same logical transaction through that key. All
/// other fields are filled in by whichever channel reports first.
#[derive(Debug, Clone)]
pub struct ProcessingRecord {
    /// Client-chosen timestamp, truncated to whole seconds (the on-chain
    /// representation stores integer seconds). Part of the identity.
    pub client_time_secs: i64,
    /// Tag of the producing source/session. Part of the identity.
    pub provider: String,

    /// Local time the transaction was submitted.
    pub started_at: Option<SystemTime>,
    /// Local time the confirmation poll returned (or the undetermined
    /// sentinel when the deadline elapsed).
    pub finished_at: Option<SystemTime>,
    /// Network-assigned transaction id.
    pub txn_id: Option<String>,
    /// Validator clock decoded from the account via the subscription.
    pub blockchain_time: Option<SystemTime>,
    /// Counter value decoded from the account via the subscription.
    pub blockchain_counter: Option<u32>,
    /// Local time the subscription notification arrived.
    pub ws_time: Option<SystemTime>,
    /// Block timestamp reported once the transaction is located.
    pub block_time: Option<SystemTime>,

    /// Bumped on every merge; drives staleness eviction. Monotonic.
    pub last_updated: Instant,
}

impl ProcessingRecord {
    pub fn new(client_time_secs: i64, provider: impl Into<String>) -> Self {
        Self {
            client_time_secs,
            provider: provider.into(),
            started_at: None,
            finished_at: None,
            txn_id: None,
            blockchain_time: None,
            blockchain_counter: None,
            ws_time: None,
            block_time: None,
            last_updated: Instant::now(),
        }
    }

    /// The merge key: truncated client seconds concatenated with the
    /// provider tag. Stable for the record's lifetime.
    pub fn identity(&self) -> String {
        format!("{}{}", self.client_time_secs, self.provider)
    }

    /// Field-wise fill-if-present union of `incoming` into `self`.
    ///
    /// Present fields on the incoming record overwrite; absent fields never
    /// erase. Identity fields are never touched. A mismatched identity is
    /// logged and the merge proceeds best-effort (known looseness, kept
    /// from the source behavior).
    pub fn merge(&mut self, incoming: &ProcessingRecord) {
        if self.identity() != incoming.identity() {
            tracing::warn!(
                target_identity = %self.identity(),
                incoming_identity = %incoming.identity(),
                "merging records with mismatched identities"
            );
        }
        if incoming.started_at.is_some() {
            self.started_at = incoming.started_at;
        }
        if incoming.finished_at.is_some() {
            self.finished_at = incoming.finished_at;
        }
        if incoming.txn_id.is_some() {
            self.txn_id = incoming.txn_id.clone();
        }
        if incoming.blockchain_time.is_some() {
            self.blockchain_time = incoming.blockchain_time;
        }
        if incoming.blockchain_counter.is_some() {
            self.blockchain_counter = incoming.blockchain_counter;
        }
        if incoming.ws_time.is_some() {
            self.ws_time = incoming.ws_time;
        }
        if incoming.block_time.is_some() {
            self.block_time = incoming.block_time;
        }
        self.last_updated = Instant::now();
    }

    /// Both channels have reported: the action loop set `started_at` and
    /// the listener set `blockchain_counter`.
    pub fn is_complete(&self) -> bool {
        self.started_at.is_some() && self.blockchain_counter.is_some()
    }

    /// Time since the last merge.
    pub fn age(&self) -> Duration {
        self.last_updated.elapsed()
    }
}
