// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use lapin::{options::BasicPublishOptions, BasicProperties, Connection, ConnectionProperties};
use serde_json::{json, Value};

/// `rabbitmq`: publishes `input.payload` to `config.exchange`/`config.routing_key`
/// over `config.url_amqp`. The matching *trigger* type consumes deliveries;
/// this activity is the send side (spec §4.2, §4.6).
pub struct RabbitMqActivity;

#[async_trait]
impl Activity for RabbitMqActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let url = config_str(config, "url_amqp").ok_or_else(|| missing_config("rabbitmq", "url_amqp"))?;
        let exchange = config_str(config, "exchange").unwrap_or("");
        let routing_key = config_str(config, "routing_key").ok_or_else(|| missing_config("rabbitmq", "routing_key"))?;

        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("rabbitmq connect failed: {e}")))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("rabbitmq channel failed: {e}")))?;

        let payload = input.get("payload").cloned().unwrap_or(Value::Null);
        let bytes = serde_json::to_vec(&payload)
            .map_err(|e| FlowError::ActivityTransport(format!("rabbitmq payload encode failed: {e}")))?;

        channel
            .basic_publish(exchange, routing_key, BasicPublishOptions::default(), &bytes, BasicProperties::default())
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("rabbitmq publish failed: {e}")))?
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("rabbitmq publish confirm failed: {e}")))?;

        Ok(json!({ "routing_key": routing_key, "published_bytes": bytes.len() }))
    }

    fn credential_keys(&self) -> &'static [&'static str] {
        &["url_amqp"]
    }
}
