// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn ctx_with_trigger(trigger: Value) -> ExecutionContext {
    ExecutionContext::new(Uuid::nil(), trigger)
}

#[test]
fn resolves_trigger_dot_path() {
    let ctx = ctx_with_trigger(json!({"body": {"msg": "hi"}}));
    assert_eq!(ctx.resolve("$.trigger.body.msg"), json!("hi"));
}

#[test]
fn missing_intermediate_key_resolves_null() {
    let ctx = ctx_with_trigger(json!({"body": {}}));
    assert_eq!(ctx.resolve("$.trigger.body.missing.deeper"), Value::Null);
}

#[test]
fn numeric_token_addresses_array_index() {
    let ctx = ctx_with_trigger(json!({"items": [10, 20, 30]}));
    assert_eq!(ctx.resolve("$.trigger.items.1"), json!(20));
}

#[test]
fn out_of_range_index_resolves_null() {
    let ctx = ctx_with_trigger(json!({"items": [1]}));
    assert_eq!(ctx.resolve("$.trigger.items.5"), Value::Null);
}

#[test]
fn non_expression_root_resolves_null() {
    let ctx = ctx_with_trigger(json!({}));
    assert_eq!(ctx.resolve("not.an.expression"), Value::Null);
}

#[test]
fn resolves_node_output_field() {
    let mut ctx = ctx_with_trigger(json!({}));
    ctx.set_node(
        "a",
        NodeFrame {
            input: json!({}),
            output: json!({"greeting": "hi"}),
            status: NodeStatus::Success,
            error: None,
            duration_ms: 5,
        },
    );
    assert_eq!(ctx.resolve("$.nodes.a.output.greeting"), json!("hi"));
    assert_eq!(ctx.resolve("$.nodes.a.status"), json!("SUCCESS"));
}

#[test]
fn resolves_node_error_when_present() {
    let mut ctx = ctx_with_trigger(json!({}));
    ctx.set_node(
        "a",
        NodeFrame {
            input: json!({}),
            output: Value::Null,
            status: NodeStatus::Error,
            error: Some("boom".into()),
            duration_ms: 1,
        },
    );
    assert_eq!(ctx.resolve("$.nodes.a.error"), json!("boom"));
}

#[test]
fn unknown_node_resolves_null() {
    let ctx = ctx_with_trigger(json!({}));
    assert_eq!(ctx.resolve("$.nodes.missing.output"), Value::Null);
}

#[test]
fn resolve_mapping_resolves_expressions_and_passes_literals() {
    let ctx = ctx_with_trigger(json!({"name": "Ana", "age": 20}));
    let mut mapping = HashMap::new();
    mapping.insert("name".to_string(), json!("$.trigger.name"));
    mapping.insert("literal".to_string(), json!(42));
    let resolved = ctx.resolve_mapping(&mapping);
    assert_eq!(resolved["name"], json!("Ana"));
    assert_eq!(resolved["literal"], json!(42));
}

#[test]
fn resolve_mapping_recurses_into_nested_maps() {
    let ctx = ctx_with_trigger(json!({"msg": "hi"}));
    let mut inner = serde_json::Map::new();
    inner.insert("deep".to_string(), json!("$.trigger.msg"));
    let mut mapping = HashMap::new();
    mapping.insert("wrapper".to_string(), Value::Object(inner));
    let resolved = ctx.resolve_mapping(&mapping);
    assert_eq!(resolved["wrapper"]["deep"], json!("hi"));
}

#[test]
fn set_writes_into_trigger() {
    let mut ctx = ctx_with_trigger(json!({}));
    ctx.set("$.trigger.body.msg", json!("hello"));
    assert_eq!(ctx.resolve("$.trigger.body.msg"), json!("hello"));
}

#[test]
fn truthy_rules_match_spec() {
    assert!(!is_truthy(&Value::Null));
    assert!(!is_truthy(&json!(0)));
    assert!(is_truthy(&json!(1)));
    assert!(is_truthy(&json!(-1)));
    assert!(!is_truthy(&json!("")));
    assert!(is_truthy(&json!("x")));
    assert!(!is_truthy(&json!([])));
    assert!(is_truthy(&json!([1])));
    assert!(!is_truthy(&json!({})));
    assert!(is_truthy(&json!({"a": 1})));
    assert!(is_truthy(&json!(true)));
    assert!(!is_truthy(&json!(false)));
}
