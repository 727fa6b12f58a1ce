// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `sftp`: transfers a file against `config.host`/`config.remote_path`
/// through the operator-configured SFTP gateway at `config.gateway_url`.
/// The gateway terminates the actual SSH session; this activity only
/// speaks HTTP to it, matching how `http` and `s3` are wired.
pub struct SftpActivity;

#[async_trait]
impl Activity for SftpActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let gateway = config_str(config, "gateway_url").ok_or_else(|| missing_config("sftp", "gateway_url"))?;
        let remote_path = config_str(config, "remote_path").ok_or_else(|| missing_config("sftp", "remote_path"))?;
        let mode = config_str(config, "mode").unwrap_or("upload");

        let client = reqwest::Client::new();
        let url = format!("{}/{}", gateway.trim_end_matches('/'), remote_path.trim_start_matches('/'));
        let response = match mode {
            "upload" => {
                let body = input.get("contents").cloned().unwrap_or(Value::Null);
                client.put(&url).json(&body).send().await
            }
            "download" => client.get(&url).send().await,
            other => return Err(FlowError::InvalidDsl(format!("sftp activity: unknown mode {other:?}"))),
        }
        .map_err(|e| FlowError::ActivityTransport(format!("sftp gateway request failed: {e}")))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FlowError::ActivityTransport(format!("sftp gateway status {status}")));
        }
        let body = response.text().await.unwrap_or_default();
        Ok(json!({ "remote_path": remote_path, "status": status, "body": body }))
    }

    fn credential_keys(&self) -> &'static [&'static str] {
        &["gateway_url", "private_key"]
    }
}
