// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use flowjs_core::SecretType;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap as Map;

#[derive(Default)]
struct InMemorySecretStore {
    records: Mutex<Map<String, EncryptedSecret>>,
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, id: &str) -> FlowResult<EncryptedSecret> {
        self.records.lock().get(id).cloned().ok_or_else(|| FlowError::SecretResolution(format!("no such secret {id}")))
    }

    async fn list(&self) -> FlowResult<Vec<EncryptedSecret>> {
        Ok(self.records.lock().values().cloned().collect())
    }

    async fn upsert(&self, secret: EncryptedSecret) -> FlowResult<()> {
        self.records.lock().insert(secret.id.clone(), secret);
        Ok(())
    }

    async fn delete(&self, id: &str) -> FlowResult<()> {
        self.records.lock().remove(id);
        Ok(())
    }
}

fn resolver() -> SecretResolver {
    let store: Arc<dyn SecretStore> = Arc::new(InMemorySecretStore::default());
    SecretResolver::new(store, &[7u8; 32])
}

#[tokio::test]
async fn encrypt_then_decrypt_round_trips() {
    let resolver = resolver();
    let mut fields = HashMap::new();
    fields.insert("password".to_string(), json!("hunter2"));
    resolver.upsert("sec_a", "db creds", SecretType::BasicAuth, &fields, HashMap::new()).await.unwrap();

    let resolved = resolver.resolve("sec_a").await.unwrap();
    assert_eq!(resolved.get("password").unwrap(), &json!("hunter2"));
}

#[tokio::test]
async fn two_encryptions_of_equal_plaintext_are_unequal_ciphertexts() {
    let store: Arc<dyn SecretStore> = Arc::new(InMemorySecretStore::default());
    let resolver = SecretResolver::new(store.clone(), &[3u8; 32]);
    let mut fields = HashMap::new();
    fields.insert("token".to_string(), json!("same-value"));

    resolver.upsert("sec_a", "a", SecretType::Token, &fields, HashMap::new()).await.unwrap();
    let first = store.get("sec_a").await.unwrap();
    resolver.upsert("sec_b", "b", SecretType::Token, &fields, HashMap::new()).await.unwrap();
    let second = store.get("sec_b").await.unwrap();

    assert_ne!(first.blob, second.blob);
}

#[tokio::test]
async fn decrypt_rejects_a_blob_shorter_than_nonce_plus_tag() {
    struct OneShotStore(EncryptedSecret);

    #[async_trait]
    impl SecretStore for OneShotStore {
        async fn get(&self, _id: &str) -> FlowResult<EncryptedSecret> {
            Ok(self.0.clone())
        }
        async fn list(&self) -> FlowResult<Vec<EncryptedSecret>> {
            Ok(vec![self.0.clone()])
        }
        async fn upsert(&self, _secret: EncryptedSecret) -> FlowResult<()> {
            Ok(())
        }
        async fn delete(&self, _id: &str) -> FlowResult<()> {
            Ok(())
        }
    }

    let truncated = EncryptedSecret {
        id: "sec_a".to_string(),
        name: "a".to_string(),
        kind: SecretType::Token,
        blob: vec![0u8; 4],
        metadata: Map::new(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let store: Arc<dyn SecretStore> = Arc::new(OneShotStore(truncated));
    let resolver = SecretResolver::new(store, &[7u8; 32]);

    let err = resolver.resolve("sec_a").await.unwrap_err();
    assert!(matches!(err, FlowError::SecretResolution(_)));
}

#[tokio::test]
async fn list_never_carries_decrypted_values() {
    let resolver = resolver();
    let mut fields = HashMap::new();
    fields.insert("password".to_string(), json!("hunter2"));
    resolver.upsert("sec_a", "db creds", SecretType::BasicAuth, &fields, HashMap::new()).await.unwrap();

    let listed = resolver.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "sec_a");
}

#[tokio::test]
async fn delete_removes_the_secret() {
    let resolver = resolver();
    let mut fields = HashMap::new();
    fields.insert("token".to_string(), json!("x"));
    resolver.upsert("sec_a", "a", SecretType::Token, &fields, HashMap::new()).await.unwrap();
    resolver.delete("sec_a").await.unwrap();
    assert!(resolver.resolve("sec_a").await.is_err());
}

#[test]
fn merge_into_config_only_overrides_credential_bearing_keys() {
    let mut config = HashMap::new();
    config.insert("url".to_string(), json!("https://example.com"));
    config.insert("method".to_string(), json!("GET"));

    let mut secret_fields = HashMap::new();
    secret_fields.insert("authorization".to_string(), json!("Bearer xyz"));
    secret_fields.insert("method".to_string(), json!("POST"));

    let merged = SecretResolver::merge_into_config(&config, &secret_fields, &["authorization"]);
    assert_eq!(merged.get("authorization").unwrap(), &json!("Bearer xyz"));
    assert_eq!(merged.get("method").unwrap(), &json!("GET"));
}
