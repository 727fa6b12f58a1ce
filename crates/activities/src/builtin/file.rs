// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `file`: reads or writes a local path named in `config.path`.
/// `config.mode` selects `"read"` (default) or `"write"`.
pub struct FileActivity;

#[async_trait]
impl Activity for FileActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let path = config_str(config, "path").ok_or_else(|| missing_config("file", "path"))?;
        let mode = config_str(config, "mode").unwrap_or("read");
        match mode {
            "write" => {
                let contents = input
                    .get("contents")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| input.to_string());
                tokio::fs::write(path, &contents)
                    .await
                    .map_err(|e| FlowError::ActivityTransport(format!("file write {path}: {e}")))?;
                Ok(json!({ "written_bytes": contents.len() }))
            }
            "read" => {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| FlowError::ActivityTransport(format!("file read {path}: {e}")))?;
                Ok(json!({ "contents": contents }))
            }
            other => Err(FlowError::InvalidDsl(format!("file activity: unknown mode {other:?}"))),
        }
    }
}
