// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::collections::HashMap;

fn config_with_script(script: &str) -> ActivityConfig {
    let mut config = HashMap::new();
    config.insert("script".to_string(), json!(script));
    config
}

#[tokio::test]
async fn object_result_becomes_the_output_map() {
    let sandbox = ScriptSandbox::new();
    let config = config_with_script(
        r#"#{ greeting: "Hello, " + input.name, isAdult: input.age >= 18 }"#,
    );
    let out = sandbox
        .execute(json!({"name": "Ana", "age": 20}), &config)
        .await
        .unwrap();
    assert_eq!(out.get("greeting").unwrap(), &json!("Hello, Ana"));
    assert_eq!(out.get("isAdult").unwrap(), &json!(true));
}

#[tokio::test]
async fn primitive_result_is_wrapped_in_value() {
    let sandbox = ScriptSandbox::new();
    let config = config_with_script("input.age + 1");
    let out = sandbox.execute(json!({"age": 20}), &config).await.unwrap();
    assert_eq!(out.get("value").unwrap(), &json!(21));
}

#[tokio::test]
async fn syntax_error_surfaces_as_script_syntax_error() {
    let sandbox = ScriptSandbox::new();
    let config = config_with_script("this is not { valid rhai +++");
    let err = sandbox.execute(json!({}), &config).await.unwrap_err();
    assert!(matches!(err, FlowError::ScriptSyntaxError(_)));
}

#[tokio::test]
async fn runtime_throw_surfaces_as_script_runtime_error() {
    let sandbox = ScriptSandbox::new();
    let config = config_with_script(r#"throw "boom";"#);
    let err = sandbox.execute(json!({}), &config).await.unwrap_err();
    assert!(matches!(err, FlowError::ScriptRuntimeError(_)));
}

#[tokio::test]
async fn console_writes_fold_into_output() {
    let sandbox = ScriptSandbox::new();
    let config = config_with_script(r#"print("hi from script"); #{ok: true}"#);
    let out = sandbox.execute(json!({}), &config).await.unwrap();
    assert_eq!(out.get("console").unwrap(), &json!(["hi from script"]));
}

#[tokio::test]
async fn missing_script_config_is_invalid_dsl() {
    let sandbox = ScriptSandbox::new();
    let err = sandbox.execute(json!({}), &HashMap::new()).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidDsl(_)));
}
