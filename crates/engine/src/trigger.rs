// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger Manager (spec §4.6): per-process lifecycle
//! `idle -> starting -> running -> stopping -> idle`, and the background
//! loops that call into the [`crate::executor::ProcessExecutor`] for
//! `cron`, `rabbitmq`, and (in-process) `manual` triggers. `rest`/`soap`
//! registration hands routing off to `flowjs-daemon`'s axum router via the
//! shared registries exposed here; `mcp` request shaping is a pure function.

use crate::executor::ProcessExecutor;
use flowjs_core::{FlowDsl, FlowError, TriggerType};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// A REST route registered by a `rest` trigger (spec §4.6), consulted by
/// the daemon's catch-all `/triggers/*` handler.
#[derive(Debug, Clone)]
pub struct RestRoute {
    pub method: String,
    pub path: String,
}

/// A SOAP route registered by a `soap` trigger.
#[derive(Debug, Clone)]
pub struct SoapRoute {
    pub path: String,
}

struct RunningTrigger {
    state: TriggerState,
    handle: Option<JoinHandle<()>>,
    stop: Arc<Notify>,
}

/// How long `stop()` waits for a background loop to observe its stop
/// signal before forcing the state back to idle (spec §4.6 "bounded drain timeout").
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TriggerManager {
    executor: Arc<ProcessExecutor>,
    triggers: RwLock<HashMap<String, RunningTrigger>>,
    rest_routes: RwLock<HashMap<String, (RestRoute, String)>>,
    soap_routes: RwLock<HashMap<String, (SoapRoute, String)>>,
    dsls: RwLock<HashMap<String, Arc<FlowDsl>>>,
}

impl TriggerManager {
    pub fn new(executor: Arc<ProcessExecutor>) -> Self {
        Self {
            executor,
            triggers: RwLock::new(HashMap::new()),
            rest_routes: RwLock::new(HashMap::new()),
            soap_routes: RwLock::new(HashMap::new()),
            dsls: RwLock::new(HashMap::new()),
        }
    }

    pub fn executor(&self) -> Arc<ProcessExecutor> {
        self.executor.clone()
    }

    pub fn state_of(&self, process_id: &str) -> TriggerState {
        self.triggers.read().get(process_id).map(|t| t.state).unwrap_or(TriggerState::Idle)
    }

    /// `IsRunning(process_id)` (spec §4.6).
    pub fn is_running(&self, process_id: &str) -> bool {
        self.state_of(process_id) == TriggerState::Running
    }

    /// `TriggerType(process_id)` (spec §4.6): the kind of the live trigger,
    /// if `process_id` currently has one deployed.
    pub fn trigger_type(&self, process_id: &str) -> Option<TriggerType> {
        self.dsls.read().get(process_id).map(|dsl| dsl.trigger.kind)
    }

    /// Resolves the DSL registered for an incoming `(method, path)` pair
    /// against the live `rest` triggers, for the daemon's `/triggers/*`
    /// catch-all handler.
    pub fn dsl_for_rest_route(&self, method: &str, path: &str) -> Option<Arc<FlowDsl>> {
        let key = format!("{} {}", method.to_uppercase(), path);
        let owner = self.rest_routes.read().get(&key).map(|(_, owner)| owner.clone())?;
        self.dsls.read().get(&owner).cloned()
    }

    /// Resolves the DSL registered for an incoming SOAP `path`, for the
    /// daemon's `/soap/*` catch-all handler.
    pub fn dsl_for_soap_path(&self, path: &str) -> Option<Arc<FlowDsl>> {
        let owner = self.soap_routes.read().get(path).map(|(_, owner)| owner.clone())?;
        self.dsls.read().get(&owner).cloned()
    }

    /// `Deploy(dsl)` (spec §4.6): stops any existing live trigger for
    /// `dsl.definition.id` first, so redeploying an already-running process
    /// never leaks the old ticker/consumer task, then `idle -> starting ->
    /// running`. `starting` failures return to `idle` with the error
    /// bubbled to the caller.
    pub async fn deploy(&self, dsl: Arc<FlowDsl>) -> Result<(), FlowError> {
        let process_id = dsl.definition.id.clone();
        if self.triggers.read().contains_key(&process_id) {
            self.stop(&process_id).await;
        }
        self.set_state(&process_id, TriggerState::Starting);

        let result = match dsl.trigger.kind {
            TriggerType::Manual => Ok(None),
            TriggerType::Cron => self.start_cron(dsl.clone()).await,
            TriggerType::Rest => self.start_rest(dsl.clone()),
            TriggerType::Soap => self.start_soap(dsl.clone()),
            TriggerType::Rabbitmq => self.start_rabbitmq(dsl.clone()).await,
            TriggerType::Mcp => Ok(None),
        };

        match result {
            Ok(handle) => {
                let stop = Arc::new(Notify::new());
                self.dsls.write().insert(process_id.clone(), dsl);
                self.triggers.write().insert(
                    process_id,
                    RunningTrigger { state: TriggerState::Running, handle, stop },
                );
                Ok(())
            }
            Err(e) => {
                self.set_state(&process_id, TriggerState::Idle);
                Err(e)
            }
        }
    }

    /// `Stop(process_id)` (spec §4.6): `running -> stopping -> idle`,
    /// forced after [`DRAIN_TIMEOUT`].
    pub async fn stop(&self, process_id: &str) {
        self.set_state(process_id, TriggerState::Stopping);
        let (handle, stop) = {
            let mut triggers = self.triggers.write();
            match triggers.get_mut(process_id) {
                Some(t) => (t.handle.take(), t.stop.clone()),
                None => {
                    return;
                }
            }
        };
        stop.notify_waiters();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(DRAIN_TIMEOUT, handle).await;
        }
        self.triggers.write().remove(process_id);
        self.rest_routes.write().retain(|_, (_, owner)| owner != process_id);
        self.soap_routes.write().retain(|_, (_, owner)| owner != process_id);
        self.dsls.write().remove(process_id);
    }

    fn set_state(&self, process_id: &str, state: TriggerState) {
        let mut triggers = self.triggers.write();
        triggers
            .entry(process_id.to_string())
            .and_modify(|t| t.state = state)
            .or_insert_with(|| RunningTrigger { state, handle: None, stop: Arc::new(Notify::new()) });
    }

    async fn start_cron(&self, dsl: Arc<FlowDsl>) -> Result<Option<JoinHandle<()>>, FlowError> {
        let expression = dsl
            .trigger
            .config
            .get("schedule")
            .and_then(Value::as_str)
            .ok_or_else(|| FlowError::TriggerStartFailure("cron trigger requires config.schedule".to_string()))?
            .to_string();
        let schedule = cron::Schedule::from_str(&expression)
            .map_err(|e| FlowError::TriggerStartFailure(format!("invalid cron schedule {expression:?}: {e}")))?;

        let executor = self.executor.clone();
        let stop = Arc::new(Notify::new());
        let stop_for_task = stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(chrono::Utc).next() else { break };
                let wait = (next - chrono::Utc::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        let _ = executor.execute(&dsl, json!({"fired_at": chrono::Utc::now().to_rfc3339()})).await;
                    }
                    _ = stop_for_task.notified() => break,
                }
            }
        });
        self.triggers.write().entry(dsl.definition.id.clone()).and_modify(|t| t.stop = stop.clone());
        Ok(Some(handle))
    }

    fn start_rest(&self, dsl: Arc<FlowDsl>) -> Result<Option<JoinHandle<()>>, FlowError> {
        let method = dsl.trigger.config.get("method").and_then(Value::as_str).unwrap_or("POST").to_uppercase();
        let path = dsl
            .trigger
            .config
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| FlowError::TriggerStartFailure("rest trigger requires config.path".to_string()))?
            .to_string();
        let key = format!("{method} {path}");
        self.rest_routes.write().insert(key, (RestRoute { method, path }, dsl.definition.id.clone()));
        Ok(None)
    }

    fn start_soap(&self, dsl: Arc<FlowDsl>) -> Result<Option<JoinHandle<()>>, FlowError> {
        let path = dsl
            .trigger
            .config
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| FlowError::TriggerStartFailure("soap trigger requires config.path".to_string()))?
            .to_string();
        self.soap_routes.write().insert(path.clone(), (SoapRoute { path }, dsl.definition.id.clone()));
        Ok(None)
    }

    async fn start_rabbitmq(&self, dsl: Arc<FlowDsl>) -> Result<Option<JoinHandle<()>>, FlowError> {
        use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions};
        use lapin::types::FieldTable;
        use lapin::{Connection, ConnectionProperties};
        use tokio_stream::StreamExt;

        let url = dsl
            .trigger
            .config
            .get("url_amqp")
            .and_then(Value::as_str)
            .ok_or_else(|| FlowError::TriggerStartFailure("rabbitmq trigger requires config.url_amqp".to_string()))?
            .to_string();
        let queue = dsl
            .trigger
            .config
            .get("queue")
            .and_then(Value::as_str)
            .ok_or_else(|| FlowError::TriggerStartFailure("rabbitmq trigger requires config.queue".to_string()))?
            .to_string();

        let connection = Connection::connect(&url, ConnectionProperties::default())
            .await
            .map_err(|e| FlowError::TriggerStartFailure(format!("rabbitmq connect failed: {e}")))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| FlowError::TriggerStartFailure(format!("rabbitmq channel failed: {e}")))?;
        let mut consumer = channel
            .basic_consume(&queue, "flowjs-works", BasicConsumeOptions::default(), FieldTable::default())
            .await
            .map_err(|e| FlowError::TriggerStartFailure(format!("rabbitmq consume failed: {e}")))?;

        let executor = self.executor.clone();
        let stop = Arc::new(Notify::new());
        let stop_for_task = stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    next = consumer.next() => {
                        let Some(Ok(delivery)) = next else { break };
                        let payload: Value = serde_json::from_slice(&delivery.data).unwrap_or(Value::Null);
                        let trigger_data = json!({ "payload": payload, "properties": {} });
                        let result = executor.execute(&dsl, trigger_data).await;
                        if result.error.is_none() {
                            let _ = delivery.ack(BasicAckOptions::default()).await;
                        } else {
                            let _ = delivery.nack(BasicNackOptions { requeue: false, ..Default::default() }).await;
                        }
                    }
                    _ = stop_for_task.notified() => break,
                }
            }
        });
        self.triggers.write().entry(dsl.definition.id.clone()).and_modify(|t| t.stop = stop.clone());
        Ok(Some(handle))
    }

    /// Stops every running trigger (spec's shutdown ordering: triggers
    /// before the audit pipeline drains).
    pub async fn stop_all(&self) {
        let ids: Vec<String> = self.triggers.read().keys().cloned().collect();
        for id in ids {
            self.stop(&id).await;
        }
    }

    pub fn rest_routes(&self) -> Vec<RestRoute> {
        self.rest_routes.read().values().map(|(r, _)| r.clone()).collect()
    }

    pub fn soap_routes(&self) -> Vec<SoapRoute> {
        self.soap_routes.read().values().map(|(r, _)| r.clone()).collect()
    }
}

/// Shapes an MCP tool call into the Executor's trigger-data envelope
/// (spec §4.6 `mcp`).
pub fn mcp_trigger_data(method: &str, params: Value, arguments: Value, client_context: Value) -> Value {
    json!({
        "tool_request": { "method": method, "params": params, "arguments": arguments },
        "client_context": client_context,
    })
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
