// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit Persister (spec §4.8): transactional `BatchInsertLogs`, and the
//! connection bring-up retry the daemon calls once at startup.

use crate::batcher::FlushFn;
use flowjs_core::{AuditEvent, FlowError, FlowResult};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

/// Connects with up to 5 attempts and quadratic back-off (`attempt^2` s),
/// per spec §4.8.
pub async fn connect_with_retry(database_url: &str) -> FlowResult<PgPool> {
    const MAX_ATTEMPTS: u32 = 5;
    let mut last_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match PgPoolOptions::new().max_connections(10).connect(database_url).await {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "postgres connect attempt failed");
                last_err = Some(e);
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(Duration::from_secs((attempt * attempt) as u64)).await;
                }
            }
        }
    }
    Err(FlowError::PersistenceError(format!(
        "could not connect to postgres after {MAX_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Builds the [`FlushFn`] the [`crate::batcher::AuditBatcher`] calls on
/// every flush, implementing `BatchInsertLogs` (spec §4.8 steps 1-3).
pub fn build_flush_fn(pool: PgPool) -> FlushFn {
    std::sync::Arc::new(move |batch: Vec<AuditEvent>| {
        let pool = pool.clone();
        Box::pin(async move { batch_insert_logs(&pool, batch).await })
    })
}

pub async fn batch_insert_logs(pool: &PgPool, batch: Vec<AuditEvent>) -> FlowResult<()> {
    if batch.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await.map_err(|e| FlowError::PersistenceError(e.to_string()))?;

    // Step 1: upsert one `executions` row per distinct execution_id in the batch.
    let mut seen = HashSet::new();
    for event in &batch {
        if !seen.insert(event.execution_id) {
            continue;
        }
        let flow_id = resolve_flow_id(&batch, event.execution_id);
        sqlx::query(
            "INSERT INTO executions (execution_id, flow_id, status, start_time) \
             VALUES ($1, $2, 'STARTED', now()) \
             ON CONFLICT (execution_id) DO NOTHING",
        )
        .bind(event.execution_id)
        .bind(flow_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    }

    // Step 2: apply the terminal lifecycle status, if this batch carries one.
    for event in &batch {
        if event.is_lifecycle() && event.status.is_terminal_lifecycle() {
            sqlx::query(
                "UPDATE executions SET status = $1, end_time = now(), main_error_message = $2 \
                 WHERE execution_id = $3",
            )
            .bind(event.status.to_string())
            .bind(event.error_msg.clone())
            .bind(event.execution_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        }
    }

    // Step 3: multi-row insert into activity_logs.
    for event in &batch {
        let input_data: Option<Value> = if event.input.is_null() { None } else { Some(event.input.clone()) };
        let output_data: Option<Value> = if event.output.is_null() { None } else { Some(event.output.clone()) };
        let error_details: Option<Value> = event.error_msg.as_ref().map(|m| serde_json::json!({ "message": m }));

        sqlx::query(
            "INSERT INTO activity_logs \
             (execution_id, node_id, node_type, status, input_data, output_data, error_details, duration_ms, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(event.execution_id)
        .bind(&event.node_id)
        .bind(&event.node_type)
        .bind(event.status.to_string())
        .bind(input_data)
        .bind(output_data)
        .bind(error_details)
        .bind(event.duration_ms as i64)
        .bind(event.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    }

    tx.commit().await.map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    Ok(())
}

/// Step 1's "first non-empty observed, else unknown" rule, pulled out so
/// it's testable without a database.
fn resolve_flow_id(batch: &[AuditEvent], execution_id: Uuid) -> String {
    batch
        .iter()
        .filter(|e| e.execution_id == execution_id && !e.flow_id.is_empty())
        .map(|e| e.flow_id.clone())
        .next()
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "persister_tests.rs"]
mod tests;
