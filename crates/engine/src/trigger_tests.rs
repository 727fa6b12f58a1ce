// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::secret::SecretResolver;
use async_trait::async_trait;
use flowjs_activities::Registry;
use flowjs_core::{
    AuditEvent, AuditSink, Definition, EncryptedSecret, ErrorStrategy, Persistence, SecretStore,
    Settings, Trigger,
};
use std::sync::Arc;

struct NoopSecretStore;

#[async_trait]
impl SecretStore for NoopSecretStore {
    async fn get(&self, id: &str) -> flowjs_core::FlowResult<EncryptedSecret> {
        Err(FlowError::SecretResolution(format!("no such secret {id}")))
    }
    async fn list(&self) -> flowjs_core::FlowResult<Vec<EncryptedSecret>> {
        Ok(Vec::new())
    }
    async fn upsert(&self, _secret: EncryptedSecret) -> flowjs_core::FlowResult<()> {
        Ok(())
    }
    async fn delete(&self, _id: &str) -> flowjs_core::FlowResult<()> {
        Ok(())
    }
}

struct NoopAuditSink;
impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) {}
}

fn manager() -> TriggerManager {
    let secrets = Arc::new(SecretResolver::new(Arc::new(NoopSecretStore), &[1u8; 32]));
    let executor = Arc::new(ProcessExecutor::new(Arc::new(Registry::with_builtins()), secrets, Arc::new(NoopAuditSink)));
    TriggerManager::new(executor)
}

fn dsl_with_trigger(id: &str, kind: TriggerType, config: HashMap<String, Value>) -> FlowDsl {
    FlowDsl {
        definition: Definition {
            id: id.to_string(),
            version: 1,
            name: id.to_string(),
            description: None,
            settings: Settings { persistence: Persistence::Full, timeout_ms: 1_000, error_strategy: ErrorStrategy::StopAndRollback },
        },
        trigger: Trigger { id: format!("trg_{id}"), kind, config },
        nodes: vec![],
        transitions: vec![],
    }
}

#[tokio::test]
async fn manual_trigger_starts_and_stops_without_a_background_loop() {
    let mgr = manager();
    let dsl = Arc::new(dsl_with_trigger("trg_manual", TriggerType::Manual, HashMap::new()));
    mgr.deploy(dsl).await.unwrap();
    assert_eq!(mgr.state_of("trg_manual"), TriggerState::Running);
    mgr.stop("trg_manual").await;
    assert_eq!(mgr.state_of("trg_manual"), TriggerState::Idle);
}

#[tokio::test]
async fn rest_trigger_registers_its_route_and_unregisters_on_stop() {
    let mgr = manager();
    let mut config = HashMap::new();
    config.insert("method".to_string(), json!("post"));
    config.insert("path".to_string(), json!("/hooks/orders"));
    let dsl = Arc::new(dsl_with_trigger("trg_rest", TriggerType::Rest, config));

    mgr.deploy(dsl).await.unwrap();
    let routes = mgr.rest_routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].method, "POST");
    assert_eq!(routes[0].path, "/hooks/orders");

    mgr.stop("trg_rest").await;
    assert!(mgr.rest_routes().is_empty());
}

#[tokio::test]
async fn dsl_for_rest_route_resolves_and_unresolves_across_the_lifecycle() {
    let mgr = manager();
    let mut config = HashMap::new();
    config.insert("method".to_string(), json!("post"));
    config.insert("path".to_string(), json!("/hooks/orders"));
    let dsl = Arc::new(dsl_with_trigger("trg_rest", TriggerType::Rest, config));

    assert!(mgr.dsl_for_rest_route("POST", "/hooks/orders").is_none());
    mgr.deploy(dsl).await.unwrap();
    assert!(mgr.dsl_for_rest_route("POST", "/hooks/orders").is_some());
    assert!(mgr.dsl_for_rest_route("GET", "/hooks/orders").is_none());

    mgr.stop("trg_rest").await;
    assert!(mgr.dsl_for_rest_route("POST", "/hooks/orders").is_none());
}

#[tokio::test]
async fn rest_trigger_without_path_fails_to_start_and_returns_to_idle() {
    let mgr = manager();
    let dsl = Arc::new(dsl_with_trigger("trg_rest", TriggerType::Rest, HashMap::new()));
    let err = mgr.deploy(dsl).await.unwrap_err();
    assert!(matches!(err, FlowError::TriggerStartFailure(_)));
    assert_eq!(mgr.state_of("trg_rest"), TriggerState::Idle);
}

#[tokio::test]
async fn soap_trigger_registers_its_route() {
    let mgr = manager();
    let mut config = HashMap::new();
    config.insert("path".to_string(), json!("/soap/orders"));
    let dsl = Arc::new(dsl_with_trigger("trg_soap", TriggerType::Soap, config));
    mgr.deploy(dsl).await.unwrap();
    let routes = mgr.soap_routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].path, "/soap/orders");
}

#[tokio::test]
async fn cron_trigger_with_invalid_schedule_fails_to_start() {
    let mgr = manager();
    let mut config = HashMap::new();
    config.insert("schedule".to_string(), json!("not a cron expression"));
    let dsl = Arc::new(dsl_with_trigger("trg_cron", TriggerType::Cron, config));
    let err = mgr.deploy(dsl).await.unwrap_err();
    assert!(matches!(err, FlowError::TriggerStartFailure(_)));
    assert_eq!(mgr.state_of("trg_cron"), TriggerState::Idle);
}

#[tokio::test]
async fn cron_trigger_starts_and_can_be_stopped() {
    let mgr = manager();
    let mut config = HashMap::new();
    config.insert("schedule".to_string(), json!("* * * * * * *"));
    let dsl = Arc::new(dsl_with_trigger("trg_cron", TriggerType::Cron, config));
    mgr.deploy(dsl).await.unwrap();
    assert_eq!(mgr.state_of("trg_cron"), TriggerState::Running);
    mgr.stop("trg_cron").await;
    assert_eq!(mgr.state_of("trg_cron"), TriggerState::Idle);
}

#[tokio::test]
async fn stop_all_idles_every_running_trigger() {
    let mgr = manager();
    mgr.deploy(Arc::new(dsl_with_trigger("trg_manual", TriggerType::Manual, HashMap::new()))).await.unwrap();
    let mut rest_config = HashMap::new();
    rest_config.insert("path".to_string(), json!("/hooks/orders"));
    mgr.deploy(Arc::new(dsl_with_trigger("trg_rest", TriggerType::Rest, rest_config))).await.unwrap();

    mgr.stop_all().await;

    assert_eq!(mgr.state_of("trg_manual"), TriggerState::Idle);
    assert_eq!(mgr.state_of("trg_rest"), TriggerState::Idle);
    assert!(mgr.rest_routes().is_empty());
}

#[tokio::test]
async fn redeploying_a_running_process_replaces_its_route_instead_of_leaking_it() {
    let mgr = manager();
    let mut config_a = HashMap::new();
    config_a.insert("path".to_string(), json!("/hooks/orders"));
    mgr.deploy(Arc::new(dsl_with_trigger("trg_rest", TriggerType::Rest, config_a))).await.unwrap();
    assert_eq!(mgr.rest_routes().len(), 1);

    let mut config_b = HashMap::new();
    config_b.insert("path".to_string(), json!("/hooks/invoices"));
    mgr.deploy(Arc::new(dsl_with_trigger("trg_rest", TriggerType::Rest, config_b))).await.unwrap();

    let routes = mgr.rest_routes();
    assert_eq!(routes.len(), 1, "the old route must be torn down, not left registered alongside the new one");
    assert_eq!(routes[0].path, "/hooks/invoices");
    assert_eq!(mgr.state_of("trg_rest"), TriggerState::Running);
}

#[tokio::test]
async fn is_running_and_trigger_type_reflect_the_live_deployment() {
    let mgr = manager();
    assert!(!mgr.is_running("trg_cron"));
    assert_eq!(mgr.trigger_type("trg_cron"), None);

    let mut config = HashMap::new();
    config.insert("schedule".to_string(), json!("* * * * * * *"));
    mgr.deploy(Arc::new(dsl_with_trigger("trg_cron", TriggerType::Cron, config))).await.unwrap();

    assert!(mgr.is_running("trg_cron"));
    assert_eq!(mgr.trigger_type("trg_cron"), Some(TriggerType::Cron));

    mgr.stop("trg_cron").await;
    assert!(!mgr.is_running("trg_cron"));
    assert_eq!(mgr.trigger_type("trg_cron"), None);
}

#[test]
fn mcp_trigger_data_shapes_the_tool_request_envelope() {
    let data = mcp_trigger_data("tools/call", json!({"a": 1}), json!({"b": 2}), json!({"session": "s1"}));
    assert_eq!(data["tool_request"]["method"], json!("tools/call"));
    assert_eq!(data["tool_request"]["params"], json!({"a": 1}));
    assert_eq!(data["tool_request"]["arguments"], json!({"b": 2}));
    assert_eq!(data["client_context"], json!({"session": "s1"}));
}
