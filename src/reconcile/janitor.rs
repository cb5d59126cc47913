//! Periodic reporting and eviction over the reconciliation table.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::observability::metrics;
use crate::reconcile::record::{delta_secs, is_undetermined, ProcessingRecord};
use crate::reconcile::table::ReconcileTable;

/// Scans the table on a fixed period: emits latency metrics for complete
/// records and evicts entries whose last update exceeded the staleness
/// threshold.
pub struct Janitor {
    table: ReconcileTable,
    period: Duration,
    stale_after: Duration,
}

impl Janitor {
    pub fn new(table: ReconcileTable, period: Duration, stale_after: Duration) -> Self {
        Self {
            table,
            period,
            stale_after,
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            period_secs = self.period.as_secs(),
            stale_after_secs = self.stale_after.as_secs(),
            "Janitor started"
        );
        let mut ticker = interval(self.period);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep(),
                _ = shutdown.recv() => {
                    tracing::info!("Janitor stopping");
                    break;
                }
            }
        }
    }

    /// One tick: snapshot the table, report complete records, evict stale
    /// ones. Deletions go to the live table by identity; the snapshot is
    /// never mutated.
    pub fn sweep(&self) {
        for (identity, record) in self.table.snapshot() {
            if record.is_complete() {
                self.report(&record);
                self.table.remove(&identity);
                metrics::record_eviction("complete");
            } else if record.age() > self.stale_after {
                tracing::error!(
                    identity = %identity,
                    txn_id = record.txn_id.as_deref().unwrap_or("-"),
                    age_secs = record.age().as_secs(),
                    "Removing record: no update within the staleness threshold"
                );
                self.table.remove(&identity);
                metrics::record_eviction("stale");
            }
        }
    }

    fn report(&self, record: &ProcessingRecord) {
        // is_complete() guarantees started_at.
        let Some(started_at) = record.started_at else {
            return;
        };

        let to_blockchain = record.blockchain_time.map(|t| delta_secs(started_at, t));
        let to_confirmation = record
            .finished_at
            .filter(|t| !is_undetermined(*t))
            .map(|t| delta_secs(started_at, t));
        let to_ws = record.ws_time.map(|t| delta_secs(started_at, t));

        tracing::info!(
            txn_id = record.txn_id.as_deref().unwrap_or("-"),
            identity = %record.identity(),
            counter = record.blockchain_counter,
            blockchain_secs = to_blockchain,
            confirmation_secs = to_confirmation,
            ws_secs = to_ws,
            "Transaction reconciled"
        );

        if let Some(secs) = to_blockchain {
            metrics::record_blockchain_latency(secs);
        }
        if let Some(secs) = to_confirmation {
            metrics::record_confirmation_latency(secs);
        }
        if let Some(secs) = to_ws {
            metrics::record_ws_latency(secs);
        }
    }
}
