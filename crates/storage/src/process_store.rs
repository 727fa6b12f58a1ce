// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed CRUD store for [`flowjs_core::ProcessRecord`] against
//! the `processes` table (spec §6), backing the daemon's
//! `GET|POST /api/v1/processes` surface.

use flowjs_core::{FlowError, FlowResult, ProcessRecord, ProcessStatus};
use sqlx::{PgPool, Row};

pub struct ProcessStore {
    pool: PgPool,
}

impl ProcessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> FlowResult<Option<ProcessRecord>> {
        let row = sqlx::query(
            "SELECT id, version, name, description, dsl, status, created_at, updated_at \
             FROM processes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        row.as_ref().map(row_to_record).transpose()
    }

    pub async fn list(&self) -> FlowResult<Vec<ProcessRecord>> {
        let rows = sqlx::query(
            "SELECT id, version, name, description, dsl, status, created_at, updated_at \
             FROM processes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        rows.iter().map(row_to_record).collect()
    }

    pub async fn upsert(&self, record: &ProcessRecord) -> FlowResult<()> {
        sqlx::query(
            "INSERT INTO processes (id, version, name, description, dsl, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET \
               version = EXCLUDED.version, name = EXCLUDED.name, description = EXCLUDED.description, \
               dsl = EXCLUDED.dsl, status = EXCLUDED.status, updated_at = EXCLUDED.updated_at",
        )
        .bind(&record.id)
        .bind(record.version as i32)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.dsl)
        .bind(process_status_str(record.status))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: ProcessStatus) -> FlowResult<()> {
        let updated = sqlx::query("UPDATE processes SET status = $1, updated_at = now() WHERE id = $2")
            .bind(process_status_str(status))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        if updated.rows_affected() == 0 {
            return Err(FlowError::PersistenceError(format!("no such process {id}")));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> FlowResult<()> {
        sqlx::query("DELETE FROM processes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        Ok(())
    }
}

fn process_status_str(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Draft => "draft",
        ProcessStatus::Deployed => "deployed",
        ProcessStatus::Stopped => "stopped",
    }
}

fn process_status_from_str(s: &str) -> FlowResult<ProcessStatus> {
    match s {
        "draft" => Ok(ProcessStatus::Draft),
        "deployed" => Ok(ProcessStatus::Deployed),
        "stopped" => Ok(ProcessStatus::Stopped),
        other => Err(FlowError::PersistenceError(format!("unknown process status in storage: {other}"))),
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> FlowResult<ProcessRecord> {
    let status: String = row.try_get("status").map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    let version: i32 = row.try_get("version").map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    Ok(ProcessRecord {
        id: row.try_get("id").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        version: version as u32,
        name: row.try_get("name").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        description: row.try_get("description").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        dsl: row.try_get("dsl").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        status: process_status_from_str(&status)?,
        created_at: row.try_get("created_at").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_status_round_trips_through_its_storage_string() {
        for status in [ProcessStatus::Draft, ProcessStatus::Deployed, ProcessStatus::Stopped] {
            assert_eq!(process_status_from_str(process_status_str(status)).unwrap(), status);
        }
    }
}
