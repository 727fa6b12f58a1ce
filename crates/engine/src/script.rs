// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script Sandbox (spec §4.3): evaluates a `code`/`script_ts` node's script
//! text with `input` bound and a `console` shim whose writes fold into the
//! node's output. Registered into [`flowjs_activities::Registry`] as the
//! `script_ts`/`code` activity, since its engine dependency (`rhai`) has no
//! place in `flowjs-activities`.

use async_trait::async_trait;
use flowjs_activities::{Activity, ActivityConfig};
use flowjs_core::FlowError;
use parking_lot::Mutex;
use rhai::{Dynamic, Engine, Scope};
use serde_json::Value;
use std::sync::Arc;

pub struct ScriptSandbox {
    engine: Engine,
}

impl ScriptSandbox {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        // No filesystem/network/process modules are registered; rhai's
        // default engine already has no such access.
        engine.set_max_operations(10_000_000);
        engine.set_max_expr_depths(64, 64);
        Self { engine }
    }

    fn run(&self, script: &str, input: Value) -> Result<(Value, Vec<String>), FlowError> {
        let console_log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let mut scope = Scope::new();
        scope.push("input", json_to_dynamic(&input));

        let mut engine = self.engine.clone();
        let sink = console_log.clone();
        engine.on_print(move |s| sink.lock().push(s.to_string()));

        let ast = engine
            .compile(script)
            .map_err(|e| FlowError::ScriptSyntaxError(e.to_string()))?;
        let result: Dynamic = engine
            .eval_ast_with_scope(&mut scope, &ast)
            .map_err(|e| FlowError::ScriptRuntimeError(e.to_string()))?;

        let value = dynamic_to_json(result);
        let lines = Arc::try_unwrap(console_log).map(Mutex::into_inner).unwrap_or_default();
        Ok((value, lines))
    }
}

impl Default for ScriptSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Activity for ScriptSandbox {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let script = config
            .get("script")
            .and_then(Value::as_str)
            .ok_or_else(|| FlowError::InvalidDsl("script_ts node requires config.script".to_string()))?
            .to_string();

        // rhai's Engine isn't Send-friendly across an await point; evaluate
        // on a blocking thread so the executor's timeout still applies via
        // the task's own cancellation.
        let sandbox_engine = self.engine.clone();
        let result = tokio::task::spawn_blocking(move || {
            let sandbox = ScriptSandbox { engine: sandbox_engine };
            sandbox.run(&script, input)
        })
        .await
        .map_err(|e| FlowError::ScriptRuntimeError(format!("script task panicked: {e}")))??;

        let (value, console_lines) = result;
        let mut output = match value {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        if !console_lines.is_empty() {
            output.insert("console".to_string(), Value::Array(console_lines.into_iter().map(Value::String).collect()));
        }
        Ok(Value::Object(output))
    }
}

fn json_to_dynamic(value: &Value) -> Dynamic {
    rhai::serde::to_dynamic(value).unwrap_or(Dynamic::UNIT)
}

fn dynamic_to_json(value: Dynamic) -> Value {
    rhai::serde::from_dynamic::<Value>(&value).unwrap_or(Value::Null)
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
