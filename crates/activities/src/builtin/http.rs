// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `http`: issues one request per invocation. Retries are the Executor's
/// job (spec §4.4 step (c)) — this activity never retries internally.
pub struct HttpActivity {
    client: reqwest::Client,
}

impl HttpActivity {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for HttpActivity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Activity for HttpActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let url = config_str(config, "url").ok_or_else(|| missing_config("http", "url"))?;
        let method = config_str(config, "method").unwrap_or("GET");
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| FlowError::InvalidDsl(format!("http activity: invalid method: {e}")))?;

        let mut request = self.client.request(method, url);
        if let Some(headers) = input.get("headers").and_then(Value::as_object) {
            for (key, value) in headers {
                if let Some(v) = value.as_str() {
                    request = request.header(key, v);
                }
            }
        }
        let body = input.get("body").cloned().unwrap_or(config.get("body").cloned().unwrap_or(Value::Null));
        if !body.is_null() {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("http request failed: {e}")))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("http response read failed: {e}")))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !(200..300).contains(&status) {
            return Err(FlowError::ActivityTransport(format!("http status {status}")));
        }
        Ok(json!({ "status": status, "body": body }))
    }

    fn credential_keys(&self) -> &'static [&'static str] {
        &["authorization", "headers"]
    }
}
