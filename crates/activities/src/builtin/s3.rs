// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `s3`: puts or gets an object against a presigned URL resolved from
/// `config.presigned_url` (or `input.presigned_url` for per-call rotation).
/// Credential material never touches this activity directly — the
/// presigned URL already encodes authorization.
pub struct S3Activity;

#[async_trait]
impl Activity for S3Activity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let url = input
            .get("presigned_url")
            .and_then(Value::as_str)
            .or_else(|| config_str(config, "presigned_url"))
            .ok_or_else(|| missing_config("s3", "presigned_url"))?;
        let mode = config_str(config, "mode").unwrap_or("put");

        let client = reqwest::Client::new();
        let response = match mode {
            "put" => {
                let body = input.get("body").cloned().unwrap_or(Value::Null);
                client.put(url).json(&body).send().await
            }
            "get" => client.get(url).send().await,
            other => return Err(FlowError::InvalidDsl(format!("s3 activity: unknown mode {other:?}"))),
        }
        .map_err(|e| FlowError::ActivityTransport(format!("s3 request failed: {e}")))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FlowError::ActivityTransport(format!("s3 status {status}")));
        }
        let body = response.text().await.unwrap_or_default();
        Ok(json!({ "status": status, "body": body }))
    }
}
