// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed [`flowjs_core::SecretStore`] against the `secrets`
//! table (spec §6). Values stay opaque here — encryption is `flowjs-engine`'s
//! `SecretResolver`'s job; this crate only persists the `nonce || ciphertext`
//! blob bytes.

use async_trait::async_trait;
use flowjs_core::{EncryptedSecret, FlowError, FlowResult, SecretStore, SecretType};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

pub struct PostgresSecretStore {
    pool: PgPool,
}

impl PostgresSecretStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretStore for PostgresSecretStore {
    async fn get(&self, id: &str) -> FlowResult<EncryptedSecret> {
        let row = sqlx::query(
            "SELECT id, name, type, encrypted_val, metadata, created_at, updated_at \
             FROM secrets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?
        .ok_or_else(|| FlowError::SecretResolution(format!("no such secret {id}")))?;
        row_to_secret(&row)
    }

    async fn list(&self) -> FlowResult<Vec<EncryptedSecret>> {
        let rows = sqlx::query(
            "SELECT id, name, type, encrypted_val, metadata, created_at, updated_at FROM secrets ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        rows.iter().map(row_to_secret).collect()
    }

    async fn upsert(&self, secret: EncryptedSecret) -> FlowResult<()> {
        let metadata = serde_json::to_value(&secret.metadata).unwrap_or(serde_json::Value::Object(Default::default()));
        sqlx::query(
            "INSERT INTO secrets (id, name, type, encrypted_val, metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, type = EXCLUDED.type, \
               encrypted_val = EXCLUDED.encrypted_val, metadata = EXCLUDED.metadata, updated_at = EXCLUDED.updated_at",
        )
        .bind(&secret.id)
        .bind(&secret.name)
        .bind(secret_type_str(secret.kind))
        .bind(&secret.blob)
        .bind(metadata)
        .bind(secret.created_at)
        .bind(secret.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> FlowResult<()> {
        sqlx::query("DELETE FROM secrets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| FlowError::PersistenceError(e.to_string()))?;
        Ok(())
    }
}

fn secret_type_str(kind: SecretType) -> &'static str {
    match kind {
        SecretType::BasicAuth => "basic_auth",
        SecretType::Token => "token",
        SecretType::Certificate => "certificate",
        SecretType::ConnectionString => "connection_string",
        SecretType::AwsCredentials => "aws_credentials",
        SecretType::SshKey => "ssh_key",
        SecretType::AmqpUrl => "amqp_url",
    }
}

fn secret_type_from_str(s: &str) -> FlowResult<SecretType> {
    match s {
        "basic_auth" => Ok(SecretType::BasicAuth),
        "token" => Ok(SecretType::Token),
        "certificate" => Ok(SecretType::Certificate),
        "connection_string" => Ok(SecretType::ConnectionString),
        "aws_credentials" => Ok(SecretType::AwsCredentials),
        "ssh_key" => Ok(SecretType::SshKey),
        "amqp_url" => Ok(SecretType::AmqpUrl),
        other => Err(FlowError::PersistenceError(format!("unknown secret type in storage: {other}"))),
    }
}

fn row_to_secret(row: &sqlx::postgres::PgRow) -> FlowResult<EncryptedSecret> {
    let kind: String = row.try_get("type").map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    let metadata_json: serde_json::Value = row.try_get("metadata").map_err(|e| FlowError::PersistenceError(e.to_string()))?;
    let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata_json).unwrap_or_default();
    Ok(EncryptedSecret {
        id: row.try_get("id").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        name: row.try_get("name").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        kind: secret_type_from_str(&kind)?,
        blob: row.try_get("encrypted_val").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        metadata,
        created_at: row.try_get("created_at").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|e| FlowError::PersistenceError(e.to_string()))?,
    })
}
