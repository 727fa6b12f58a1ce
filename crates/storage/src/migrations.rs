// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The schema from spec §6, applied once at daemon startup.

use flowjs_core::{FlowError, FlowResult};
use sqlx::PgPool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS executions (
    execution_id UUID PRIMARY KEY,
    flow_id TEXT NOT NULL,
    version INT,
    status TEXT NOT NULL,
    correlation_id UUID,
    start_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    end_time TIMESTAMPTZ,
    trigger_type TEXT,
    main_error_message TEXT
);

CREATE TABLE IF NOT EXISTS activity_logs (
    log_id BIGSERIAL PRIMARY KEY,
    execution_id UUID NOT NULL REFERENCES executions(execution_id),
    node_id TEXT NOT NULL,
    node_type TEXT NOT NULL,
    status TEXT NOT NULL,
    input_data JSONB,
    output_data JSONB,
    error_details JSONB,
    duration_ms BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS activity_logs_input_data_gin ON activity_logs USING GIN (input_data);
CREATE INDEX IF NOT EXISTS activity_logs_output_data_gin ON activity_logs USING GIN (output_data);
CREATE INDEX IF NOT EXISTS activity_logs_execution_id_idx ON activity_logs (execution_id);

CREATE TABLE IF NOT EXISTS processes (
    id TEXT PRIMARY KEY,
    version INT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    dsl JSONB NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS secrets (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    encrypted_val BYTEA NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Applies the schema. Idempotent: every statement is `CREATE ... IF NOT EXISTS`.
pub async fn run_migrations(pool: &PgPool) -> FlowResult<()> {
    for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await.map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    }
    Ok(())
}
