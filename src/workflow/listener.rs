//! WebSocket account subscription listener.
//!
//! # Responsibilities
//! - Keep one `accountSubscribe` stream open on the counter data account
//! - Decode every notification into a processing record and merge it
//! - Reconnect with jittered backoff when the stream drops
//!
//! A malformed notification is fatal only to that message; it is logged and
//! dropped while the subscription stays up. The subscription target is
//! re-derived from the same inputs on every reconnect, so no server-side
//! state needs to survive.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::codec::{decode_counter_account, parse_account_envelope, CodecError, CounterAccountSnapshot};
use crate::config::{ActionConfig, RpcConfig};
use crate::observability::metrics;
use crate::reconcile::record::{from_unix_secs, ProcessingRecord};
use crate::reconcile::ReconcileTable;
use crate::resilience::calculate_backoff;
use crate::rpc::types::Pubkey;

/// Errors that tear down a single subscription session.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

enum SessionEnd {
    Shutdown,
    Closed,
}

/// Long-lived subscription task feeding the reconciliation table.
pub struct AccountListener {
    ws_url: String,
    commitment: String,
    data_account: Pubkey,
    provider: String,
    table: ReconcileTable,
}

impl AccountListener {
    pub fn new(
        rpc: &RpcConfig,
        action: &ActionConfig,
        data_account: Pubkey,
        table: ReconcileTable,
    ) -> Self {
        Self {
            ws_url: rpc.ws_url.clone(),
            commitment: rpc.commitment.clone(),
            data_account,
            provider: action.provider.clone(),
            table,
        }
    }

    /// Run until shutdown, reconnecting across stream failures.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut attempt: u32 = 0;
        loop {
            let delay = calculate_backoff(attempt, 500, 30_000);
            if !delay.is_zero() {
                tracing::info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting account subscription"
                );
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = shutdown.recv() => return,
                }
            }

            match self.session(&mut shutdown).await {
                Ok(SessionEnd::Shutdown) => {
                    tracing::info!("Subscription listener stopping");
                    return;
                }
                Ok(SessionEnd::Closed) => {
                    tracing::warn!("Subscription stream closed by peer");
                    attempt = 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscription session failed");
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    async fn session(
        &self,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<SessionEnd, ListenerError> {
        let (mut ws, _) = connect_async(&self.ws_url).await?;
        let request = subscription_request(&self.data_account, &self.commitment);
        ws.send(Message::text(request.to_string())).await?;
        tracing::info!(account = %self.data_account, "Account subscription opened");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    let _ = ws.close(None).await;
                    return Ok(SessionEnd::Shutdown);
                }
                message = ws.next() => {
                    match message {
                        None | Some(Ok(Message::Close(_))) => return Ok(SessionEnd::Closed),
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(Message::Text(text))) => self.handle_message(text.as_str()),
                        // Pings and pongs are answered by the stack.
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    /// Process one inbound frame. Failures are logged and the frame is
    /// dropped; the subscription itself stays up.
    fn handle_message(&self, raw: &str) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping non-JSON subscription frame");
                metrics::record_ws_message("malformed");
                return;
            }
        };

        // The first reply to accountSubscribe is an ack carrying the
        // subscription id in `result`.
        if value.get("method").is_none() {
            tracing::info!(ack = %value, "Subscription acknowledged");
            return;
        }

        let Some(payload) = value.pointer("/params/result") else {
            tracing::warn!("Dropping notification without params.result");
            metrics::record_ws_message("malformed");
            return;
        };

        match decode_notification(payload) {
            Ok(snapshot) => {
                let mut record =
                    ProcessingRecord::new(snapshot.client_timestamp, self.provider.clone());
                record.blockchain_time = Some(from_unix_secs(snapshot.block_timestamp));
                record.blockchain_counter = Some(snapshot.counter);
                record.ws_time = Some(SystemTime::now());

                tracing::debug!(
                    counter = snapshot.counter,
                    client_timestamp = snapshot.client_timestamp,
                    "Account update received"
                );
                self.table.upsert_merge(record);
                metrics::record_ws_message("ok");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable account notification");
                metrics::record_ws_message("decode_failed");
            }
        }
    }
}

/// Decode a notification's `params.result` into a counter snapshot.
pub fn decode_notification(payload: &Value) -> Result<CounterAccountSnapshot, CodecError> {
    let envelope = parse_account_envelope(payload)?;
    envelope.require_data_account()?;
    decode_counter_account(&envelope.data)
}

fn subscription_request(account: &Pubkey, commitment: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "accountSubscribe",
        "params": [
            account.to_string(),
            { "encoding": "base64", "commitment": commitment }
        ]
    })
}
