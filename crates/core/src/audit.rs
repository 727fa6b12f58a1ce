// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-the-wire `AuditEvent` (spec §3), published by the Executor and
//! Trigger Manager, consumed by the Audit Subscriber (`flowjs-wire`) and
//! batched/persisted by `flowjs-storage`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dsl::AuditStatus;

/// `node_type` used for the lifecycle events named in spec §4.4
/// (`deployed`, `stopped`, `started`, `completed`, `failed`, `replayed`).
pub const PROCESS_NODE_TYPE: &str = "process";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub execution_id: Uuid,
    pub flow_id: String,
    pub node_id: String,
    pub node_type: String,
    pub status: AuditStatus,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    pub duration_ms: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AuditEvent {
    /// A lifecycle event (spec §4.4): `node_type = "process"`, no per-node
    /// output. `input` is normally `Value::Null`; the `started` event
    /// carries the triggering payload so replay can recover it later.
    pub fn lifecycle(
        execution_id: Uuid,
        flow_id: impl Into<String>,
        status: AuditStatus,
        input: Value,
        error_msg: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            execution_id,
            flow_id: flow_id.into(),
            node_id: PROCESS_NODE_TYPE.to_string(),
            node_type: PROCESS_NODE_TYPE.to_string(),
            status,
            input,
            output: Value::Null,
            error_msg,
            duration_ms,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        self.node_type == PROCESS_NODE_TYPE
    }
}
