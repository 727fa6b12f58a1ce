// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful shutdown ordering: stop accepting new triggers, drain the
//! audit subscription, then flush the batcher before the process exits.

use crate::state::AppState;
use flowjs_wire::AuditSubscriber;
use std::sync::Arc;
use tracing::info;

pub async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Runs the shutdown sequence in order:
/// 1. stop every running trigger so no new executions start,
/// 2. drain the NATS audit subscription,
/// 3. flush and stop the audit batcher.
pub async fn run(state: AppState, subscriber: Arc<AuditSubscriber>) {
    info!("shutdown signal received, stopping triggers");
    state.triggers.stop_all().await;

    info!("draining audit subscriber");
    subscriber.stop().await;

    info!("flushing audit batcher");
    state.batcher.stop().await;

    info!("shutdown complete");
}
