// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret Resolver (spec §4.5): AEAD encrypt/decrypt over a `SecretStore`,
//! plus the effective-config merge a node's `secret_ref` performs.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use flowjs_activities::ActivityConfig;
use flowjs_core::{EncryptedSecret, FlowError, FlowResult, SecretMetadata, SecretStore, SecretType};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
    cipher: Aes256Gcm,
}

impl SecretResolver {
    /// `key` must be exactly 32 bytes (spec §6 `SECRETS_AES_KEY`).
    pub fn new(store: Arc<dyn SecretStore>, key: &[u8; 32]) -> Self {
        Self { store, cipher: Aes256Gcm::new(key.into()) }
    }

    /// Encrypts `plaintext` under a fresh nonce and returns `nonce ||
    /// ciphertext+tag` as one blob (spec §4.5 `Encrypt`).
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .expect("AES-256-GCM encryption over an in-memory buffer cannot fail");
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        blob
    }

    /// Splits the leading nonce off `blob` and decrypts the rest (spec §4.5
    /// `Decrypt`); fails if `blob` is shorter than `nonce_size + tag_size`.
    fn decrypt(&self, blob: &[u8]) -> FlowResult<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(FlowError::SecretResolution("stored secret blob is shorter than nonce+tag".to_string()));
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| FlowError::SecretResolution(format!("decrypt failed: {e}")))
    }

    /// Resolve a secret's plaintext fields (spec §4.5 `Resolve`).
    pub async fn resolve(&self, secret_id: &str) -> FlowResult<HashMap<String, serde_json::Value>> {
        let record = self.store.get(secret_id).await?;
        let plaintext = self.decrypt(&record.blob)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| FlowError::SecretResolution(format!("secret {secret_id} payload is not valid JSON: {e}")))
    }

    /// Metadata listing, never carrying decrypted values (spec §4.5 `List`).
    pub async fn list(&self) -> FlowResult<Vec<SecretMetadata>> {
        let records = self.store.list().await?;
        Ok(records.into_iter().map(to_metadata).collect())
    }

    /// Encrypt and persist a secret (spec §4.5 `Upsert`).
    pub async fn upsert(
        &self,
        id: &str,
        name: &str,
        kind: SecretType,
        fields: &HashMap<String, serde_json::Value>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> FlowResult<()> {
        let plaintext = serde_json::to_vec(fields)
            .map_err(|e| FlowError::SecretResolution(format!("secret fields not serializable: {e}")))?;
        let blob = self.encrypt(&plaintext);
        let now = chrono::Utc::now();
        self.store
            .upsert(EncryptedSecret {
                id: id.to_string(),
                name: name.to_string(),
                kind,
                blob,
                metadata,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> FlowResult<()> {
        self.store.delete(id).await
    }

    /// Merge a resolved secret into a node's effective config (spec §4.4
    /// step (b)): the secret's fields win only over keys the activity marks
    /// credential-bearing.
    pub fn merge_into_config(
        config: &ActivityConfig,
        secret_fields: &HashMap<String, serde_json::Value>,
        credential_keys: &[&str],
    ) -> ActivityConfig {
        let mut effective = config.clone();
        for (key, value) in secret_fields {
            if credential_keys.contains(&key.as_str()) {
                effective.insert(key.clone(), value.clone());
            }
        }
        effective
    }
}

fn to_metadata(record: EncryptedSecret) -> SecretMetadata {
    SecretMetadata {
        id: record.id,
        name: record.name,
        kind: record.kind,
        metadata: record.metadata,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
