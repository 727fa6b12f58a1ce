// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `logger`/`log`: writes `input` (or `config.message`) to the process log
/// and echoes it back as the node's output.
pub struct LoggerActivity;

#[async_trait]
impl Activity for LoggerActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let message = input
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| config.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| input.to_string());
        tracing::info!(%message, "logger activity");
        Ok(json!({ "logged": message }))
    }
}
