// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowjs_core::AuditStatus;

fn event(execution_id: Uuid, flow_id: &str) -> AuditEvent {
    AuditEvent::lifecycle(execution_id, flow_id, AuditStatus::Started, serde_json::Value::Null, None, 0)
}

#[test]
fn resolve_flow_id_picks_first_non_empty_observed() {
    let execution_id = Uuid::new_v4();
    let batch = vec![event(execution_id, ""), event(execution_id, "orders-sync")];
    assert_eq!(resolve_flow_id(&batch, execution_id), "orders-sync");
}

#[test]
fn resolve_flow_id_falls_back_to_unknown() {
    let execution_id = Uuid::new_v4();
    let batch = vec![event(execution_id, "")];
    assert_eq!(resolve_flow_id(&batch, execution_id), "unknown");
}

/// Exercises the full transactional `BatchInsertLogs` path against a real
/// Postgres instance. Requires `DATABASE_URL` to point at a database with
/// the schema from `flowjs-storage`'s migrations applied.
#[tokio::test]
#[ignore = "requires a live Postgres instance reachable at DATABASE_URL"]
async fn batch_insert_logs_upserts_executions_and_inserts_activity_rows() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    let pool = connect_with_retry(&database_url).await.unwrap();

    let execution_id = Uuid::new_v4();
    let node_event = AuditEvent {
        execution_id,
        flow_id: "orders-sync".to_string(),
        node_id: "a".to_string(),
        node_type: "logger".to_string(),
        status: AuditStatus::Success,
        input: serde_json::json!({"x": 1}),
        output: serde_json::json!({"y": 2}),
        error_msg: None,
        duration_ms: 12,
        timestamp: chrono::Utc::now(),
    };
    let lifecycle_event = AuditEvent::lifecycle(execution_id, "orders-sync", AuditStatus::Completed, serde_json::Value::Null, None, 50);

    batch_insert_logs(&pool, vec![node_event, lifecycle_event]).await.unwrap();

    let status: String = sqlx::query_scalar("SELECT status FROM executions WHERE execution_id = $1")
        .bind(execution_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "COMPLETED");

    let log_count: i64 = sqlx::query_scalar("SELECT count(*) FROM activity_logs WHERE execution_id = $1")
        .bind(execution_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(log_count, 1);
}
