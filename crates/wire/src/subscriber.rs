// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit Subscriber (spec §4.9): consumes `AuditEvent`s published to
//! `audit.logs` and forwards decoded events to the Audit Batcher (C7).

use flowjs_core::{AuditEvent, FlowError, FlowResult};
use flowjs_storage::AuditBatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_stream::StreamExt;

pub const SUBJECT: &str = "audit.logs";

/// Connects with up to 10 linear-back-off attempts for the initial
/// connect, then unlimited reconnects at a fixed 2 s interval (spec §4.9).
pub async fn connect(nats_url: &str) -> FlowResult<async_nats::Client> {
    const MAX_INITIAL_ATTEMPTS: u32 = 10;
    let mut last_err = None;
    for attempt in 1..=MAX_INITIAL_ATTEMPTS {
        let options = async_nats::ConnectOptions::new().reconnect_delay_callback(|_attempts| Duration::from_secs(2));
        match options.connect(nats_url).await {
            Ok(client) => return Ok(client),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "nats initial connect attempt failed");
                last_err = Some(e);
                if attempt < MAX_INITIAL_ATTEMPTS {
                    tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                }
            }
        }
    }
    Err(FlowError::PersistenceError(format!(
        "could not connect to nats after {MAX_INITIAL_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

pub struct AuditSubscriber {
    client: async_nats::Client,
    batcher: Arc<AuditBatcher>,
    stop: Arc<Notify>,
}

impl AuditSubscriber {
    pub fn new(client: async_nats::Client, batcher: Arc<AuditBatcher>) -> Self {
        Self { client, batcher, stop: Arc::new(Notify::new()) }
    }

    /// Runs the receive loop until [`Self::stop`] is called or the
    /// subscription ends. Each delivery is JSON-decoded; decode failures
    /// are logged and dropped without tearing down the subscription.
    pub async fn run(&self) -> FlowResult<()> {
        let mut subscriber = self
            .client
            .subscribe(SUBJECT)
            .await
            .map_err(|e| FlowError::PersistenceError(format!("nats subscribe failed: {e}")))?;

        loop {
            tokio::select! {
                next = subscriber.next() => {
                    let Some(message) = next else { break };
                    if let Some(event) = decode(&message.payload) {
                        self.batcher.add(event).await;
                    }
                }
                _ = self.stop.notified() => break,
            }
        }
        Ok(())
    }

    /// Drains the subscription before the caller closes the connection
    /// (spec §4.9 shutdown ordering).
    pub async fn stop(&self) {
        self.stop.notify_waiters();
        let _ = self.client.drain().await;
    }
}

fn decode(payload: &[u8]) -> Option<AuditEvent> {
    match serde_json::from_slice::<AuditEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode audit event payload");
            None
        }
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
