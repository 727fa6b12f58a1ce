// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowjs_core::{Definition, ErrorStrategy, Node, NodeType, Persistence, Settings, Transition, TransitionType, Trigger, TriggerType};
use serde_json::json;
use std::collections::HashMap;

fn base_node(id: &str) -> Node {
    Node {
        id: id.to_string(),
        kind: NodeType::Log,
        description: None,
        input_mapping: HashMap::new(),
        config: HashMap::new(),
        secret_ref: None,
        retry_policy: None,
        next: None,
        script: None,
    }
}

fn base_dsl() -> FlowDsl {
    FlowDsl {
        definition: Definition {
            id: "my-process".to_string(),
            version: 1,
            name: "My Process".to_string(),
            description: None,
            settings: Settings {
                persistence: Persistence::Full,
                timeout_ms: 5_000,
                error_strategy: ErrorStrategy::StopAndRollback,
            },
        },
        trigger: Trigger {
            id: "trg_abc".to_string(),
            kind: TriggerType::Manual,
            config: HashMap::new(),
        },
        nodes: vec![base_node("fetch")],
        transitions: vec![Transition {
            from: "trg_abc".to_string(),
            to: "fetch".to_string(),
            kind: TransitionType::Success,
            condition: None,
        }],
    }
}

#[test]
fn accepts_well_formed_dsl() {
    assert!(validate(&base_dsl()).is_ok());
}

#[test]
fn rejects_malformed_trigger_id() {
    let mut dsl = base_dsl();
    dsl.trigger.id = "not-prefixed".to_string();
    assert!(validate(&dsl).is_err());
}

#[test]
fn rejects_duplicate_node_ids() {
    let mut dsl = base_dsl();
    dsl.nodes.push(base_node("fetch"));
    assert!(validate(&dsl).is_err());
}

#[test]
fn rejects_node_id_colliding_with_trigger() {
    let mut dsl = base_dsl();
    dsl.nodes.push(base_node("trg_abc"));
    assert!(validate(&dsl).is_err());
}

#[test]
fn rejects_transition_to_unknown_node() {
    let mut dsl = base_dsl();
    dsl.transitions.push(Transition {
        from: "fetch".to_string(),
        to: "ghost".to_string(),
        kind: TransitionType::Success,
        condition: None,
    });
    assert!(validate(&dsl).is_err());
}

#[test]
fn rejects_node_with_no_inbound_transition_when_transitions_declared() {
    let mut dsl = base_dsl();
    dsl.nodes.push(base_node("orphan"));
    assert!(validate(&dsl).is_err());
}

#[test]
fn flat_dsl_with_no_transitions_is_exempt_from_inbound_check() {
    let mut dsl = base_dsl();
    dsl.transitions.clear();
    dsl.nodes.push(base_node("second"));
    assert!(validate(&dsl).is_ok());
}

#[test]
fn accepts_well_formed_input_mapping_expressions() {
    let mut dsl = base_dsl();
    dsl.nodes[0].input_mapping.insert("a".to_string(), json!("$.trigger.body.id"));
    dsl.nodes[0].input_mapping.insert("b".to_string(), json!("$.nodes.fetch.output.value"));
    dsl.nodes[0].input_mapping.insert("c".to_string(), json!(42));
    assert!(validate(&dsl).is_ok());
}

#[test]
fn rejects_malformed_input_mapping_expression() {
    let mut dsl = base_dsl();
    dsl.nodes[0].input_mapping.insert("a".to_string(), json!("$.bogus.path"));
    assert!(validate(&dsl).is_err());
}

#[test]
fn rejects_raw_credential_key_in_config() {
    let mut dsl = base_dsl();
    dsl.nodes[0].config.insert("password".to_string(), json!("hunter2"));
    assert!(validate(&dsl).is_err());
}

#[test]
fn accepts_credentials_behind_secret_ref() {
    let mut dsl = base_dsl();
    dsl.nodes[0].secret_ref = Some("sec_abc".to_string());
    assert!(validate(&dsl).is_ok());
}
