// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `smb`: writes or reads a share file through the same HTTP gateway
/// pattern as [`super::sftp::SftpActivity`] (`config.gateway_url` +
/// `config.share_path`).
pub struct SmbActivity;

#[async_trait]
impl Activity for SmbActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let gateway = config_str(config, "gateway_url").ok_or_else(|| missing_config("smb", "gateway_url"))?;
        let share_path = config_str(config, "share_path").ok_or_else(|| missing_config("smb", "share_path"))?;
        let mode = config_str(config, "mode").unwrap_or("write");

        let client = reqwest::Client::new();
        let url = format!("{}/{}", gateway.trim_end_matches('/'), share_path.trim_start_matches('/'));
        let response = match mode {
            "write" => {
                let body = input.get("contents").cloned().unwrap_or(Value::Null);
                client.put(&url).json(&body).send().await
            }
            "read" => client.get(&url).send().await,
            other => return Err(FlowError::InvalidDsl(format!("smb activity: unknown mode {other:?}"))),
        }
        .map_err(|e| FlowError::ActivityTransport(format!("smb gateway request failed: {e}")))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FlowError::ActivityTransport(format!("smb gateway status {status}")));
        }
        let body = response.text().await.unwrap_or_default();
        Ok(json!({ "share_path": share_path, "status": status, "body": body }))
    }

    fn credential_keys(&self) -> &'static [&'static str] {
        &["gateway_url", "domain", "username"]
    }
}
