// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};

/// `mail`: posts `{to, subject, body}` to a transactional email relay at
/// `config.relay_url`, authorized by an `Authorization` header resolved
/// from a `token` secret.
pub struct MailActivity {
    client: reqwest::Client,
}

impl MailActivity {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for MailActivity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Activity for MailActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let relay_url = config_str(config, "relay_url").ok_or_else(|| missing_config("mail", "relay_url"))?;
        let to = input.get("to").and_then(Value::as_str).ok_or_else(|| missing_config("mail", "to"))?;
        let subject = input.get("subject").and_then(Value::as_str).unwrap_or_default();
        let body = input.get("body").and_then(Value::as_str).unwrap_or_default();

        let mut request = self.client.post(relay_url).json(&json!({
            "to": to,
            "subject": subject,
            "body": body,
        }));
        if let Some(token) = config_str(config, "authorization") {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("mail relay request failed: {e}")))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FlowError::ActivityTransport(format!("mail relay status {status}")));
        }
        Ok(json!({ "status": status, "to": to }))
    }

    fn credential_keys(&self) -> &'static [&'static str] {
        &["authorization"]
    }
}
