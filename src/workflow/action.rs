//! Counter-increment action loop.
//!
//! # Responsibilities
//! - Build, sign and submit one increment transaction per tick
//! - Poll the transaction to confirmation under a deadline
//! - Emit the resulting processing record into the reconciliation table
//!
//! A failed submission is not retried inside the iteration; the loop's own
//! cadence is the retry. Confirmation polling runs against a monotonic
//! deadline; wall-clock values only end up in the record for latency
//! reporting.

use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tokio::time::{interval, sleep, timeout};

use crate::config::ActionConfig;
use crate::observability::metrics;
use crate::reconcile::record::{from_unix_secs, undetermined, unix_secs, ProcessingRecord};
use crate::reconcile::ReconcileTable;
use crate::rpc::gateway::Gateway;
use crate::rpc::transaction::increment_counter_transaction;
use crate::rpc::types::{Pubkey, RpcResult, TransactionStatus};
use crate::rpc::wallet::{self, Wallet};

/// Bounded loop submitting counter increments and recording their lifecycle.
pub struct ActionLoop<G> {
    gateway: Arc<G>,
    payer: Arc<Wallet>,
    program: Arc<Wallet>,
    config: ActionConfig,
    table: ReconcileTable,
}

impl<G: Gateway> ActionLoop<G> {
    pub fn new(
        gateway: Arc<G>,
        payer: Arc<Wallet>,
        program: Arc<Wallet>,
        config: ActionConfig,
        table: ReconcileTable,
    ) -> Self {
        Self {
            gateway,
            payer,
            program,
            config,
            table,
        }
    }

    /// Run the configured number of iterations, or until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let data_account =
            wallet::data_account_address(&self.payer.pubkey(), &self.program.pubkey());
        tracing::info!(
            iterations = self.config.iterations,
            data_account = %data_account,
            "Action loop started"
        );

        for iteration in 1..=self.config.iterations {
            tracing::info!(iteration, "Submitting counter increment");
            match self.run_iteration(&data_account).await {
                Ok(Some(record)) => self.table.upsert_merge(record),
                // Submission failed; already logged, next tick is the retry.
                Ok(None) => {}
                Err(e) => tracing::error!(iteration, error = %e, "Iteration failed"),
            }

            if iteration < self.config.iterations {
                tokio::select! {
                    _ = sleep(Duration::from_secs(self.config.sleep_secs)) => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Action loop stopping");
                        return;
                    }
                }
            }
        }
        tracing::info!("Action loop finished");
    }

    /// One iteration: submit and poll. `Ok(None)` means the submission
    /// never yielded a transaction id.
    pub async fn run_iteration(
        &self,
        data_account: &Pubkey,
    ) -> RpcResult<Option<ProcessingRecord>> {
        let started_at = SystemTime::now();
        let client_time_secs = unix_secs(started_at);

        let recent = self.gateway.get_recent_blockhash().await?;
        let tx = match increment_counter_transaction(
            &self.payer,
            &self.program,
            data_account,
            client_time_secs,
            recent.blockhash,
        ) {
            Ok(tx) => tx,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build increment transaction");
                metrics::record_submission("build_failed");
                return Ok(None);
            }
        };

        let txn_id = match self.gateway.submit_transaction(&tx).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Transaction submission failed");
                metrics::record_submission("failed");
                return Ok(None);
            }
        };
        metrics::record_submission("ok");

        let mut record = ProcessingRecord::new(client_time_secs, self.config.provider.clone());
        record.started_at = Some(started_at);
        record.txn_id = Some(txn_id.clone());

        match self.poll_confirmation(&txn_id).await {
            Some(block_time) => {
                let finished_at = SystemTime::now();
                record.finished_at = Some(finished_at);
                record.block_time = block_time.map(from_unix_secs);
                tracing::info!(
                    txn_id = %txn_id,
                    secs = crate::reconcile::record::delta_secs(started_at, finished_at),
                    "Transaction confirmed"
                );
            }
            None => {
                // Undetermined, not absent: the poll gave up, the network
                // may still land the transaction.
                tracing::warn!(
                    txn_id = %txn_id,
                    deadline_secs = self.config.confirm_timeout_secs,
                    "Confirmation deadline elapsed"
                );
                record.finished_at = Some(undetermined());
                record.block_time = Some(undetermined());
            }
        }

        Ok(Some(record))
    }

    /// Poll until the network reports the transaction confirmed.
    /// `None` means the deadline elapsed first. Transport errors are
    /// retried until the same deadline.
    async fn poll_confirmation(&self, txn_id: &str) -> Option<Option<i64>> {
        let deadline = Duration::from_secs(self.config.confirm_timeout_secs);
        timeout(deadline, async {
            let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
            loop {
                ticker.tick().await;
                match self.gateway.get_transaction_status(txn_id).await {
                    Ok(TransactionStatus::Confirmed { block_time }) => return block_time,
                    Ok(TransactionStatus::Pending) | Ok(TransactionStatus::NotFound) => {}
                    Err(e) => {
                        tracing::debug!(txn_id = %txn_id, error = %e, "Status poll failed, retrying");
                    }
                }
            }
        })
        .await
        .ok()
    }
}
