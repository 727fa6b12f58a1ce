// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ports shared between `flowjs-engine` (which calls them) and
//! `flowjs-storage` (which implements them against Postgres), so neither
//! crate depends on the other.

use crate::audit::AuditEvent;
use crate::dsl::SecretType;
use crate::error::FlowResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Sink an [`AuditEvent`] reaches on its way to the Audit Batcher (spec §4.7).
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// A secret's encrypted-at-rest record (spec §3 `SecretRecord`), as read
/// back from the `secrets` table (spec §6). `blob` is the fresh nonce for
/// this record prepended to its AEAD ciphertext+tag (spec §4.5 `Encrypt`).
#[derive(Debug, Clone)]
pub struct EncryptedSecret {
    pub id: String,
    pub name: String,
    pub kind: SecretType,
    pub blob: Vec<u8>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Persistence port the Secret Resolver (spec §4.5) reads/writes through.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, id: &str) -> FlowResult<EncryptedSecret>;
    async fn list(&self) -> FlowResult<Vec<EncryptedSecret>>;
    async fn upsert(&self, secret: EncryptedSecret) -> FlowResult<()>;
    async fn delete(&self, id: &str) -> FlowResult<()>;
}
