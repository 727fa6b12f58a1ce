// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The FlowDSL data model (spec §3). This is the immutable contract: parsing
//! and structural validation live in `flowjs-dsl`, execution in
//! `flowjs-engine` — this crate only owns the shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A complete flow definition as authored in the visual designer (out of
/// scope) and deployed through the process CRUD surface (out of scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDsl {
    pub definition: Definition,
    pub trigger: Trigger,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub id: String,
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    Full,
    Minimal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStrategy {
    StopAndRollback,
    Continue,
    Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_persistence")]
    pub persistence: Persistence,
    pub timeout_ms: u64,
    #[serde(default = "Settings::default_error_strategy")]
    pub error_strategy: ErrorStrategy,
}

impl Settings {
    fn default_persistence() -> Persistence {
        Persistence::Full
    }
    fn default_error_strategy() -> ErrorStrategy {
        ErrorStrategy::StopAndRollback
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Cron,
    Rest,
    Soap,
    Rabbitmq,
    Mcp,
    Manual,
}

crate::simple_display! {
    TriggerType {
        Cron => "cron",
        Rest => "rest",
        Soap => "soap",
        Rabbitmq => "rabbitmq",
        Mcp => "mcp",
        Manual => "manual",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TriggerType,
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Http,
    Sftp,
    S3,
    Smb,
    Mail,
    Rabbitmq,
    Sql,
    Code,
    Log,
    Transform,
    File,
    ScriptTs,
    Logger,
}

impl NodeType {
    /// Activity registry key for this node type (spec §4.2: `logger/log`, `script_ts/code`).
    pub fn activity_key(&self) -> &'static str {
        match self {
            NodeType::Http => "http",
            NodeType::Sftp => "sftp",
            NodeType::S3 => "s3",
            NodeType::Smb => "smb",
            NodeType::Mail => "mail",
            NodeType::Rabbitmq => "rabbitmq",
            NodeType::Sql => "sql",
            NodeType::Code => "script_ts",
            NodeType::ScriptTs => "script_ts",
            NodeType::Log => "logger",
            NodeType::Logger => "logger",
            NodeType::Transform => "transform",
            NodeType::File => "file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryType {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: String,
    #[serde(rename = "type", default = "RetryPolicy::default_type")]
    pub kind: RetryType,
}

impl RetryPolicy {
    fn default_type() -> RetryType {
        RetryType::Fixed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_mapping: HashMap<String, Value>,
    #[serde(default)]
    pub config: HashMap<String, Value>,
    #[serde(default)]
    pub secret_ref: Option<String>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    Success,
    Error,
    Condition,
    Nocondition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: TransitionType,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Status recorded for a node's terminal frame in the [`crate::context::ExecutionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeStatus {
    Success,
    Error,
}

crate::simple_display! {
    NodeStatus {
        Success => "SUCCESS",
        Error => "ERROR",
    }
}

/// Status carried on the wire in an [`crate::audit::AuditEvent`] (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Success,
    Error,
    Started,
    Completed,
    Failed,
    Replayed,
}

crate::simple_display! {
    AuditStatus {
        Success => "SUCCESS",
        Error => "ERROR",
        Started => "STARTED",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Replayed => "REPLAYED",
    }
}

impl AuditStatus {
    /// True for the terminal lifecycle statuses the Persister watches for (§4.8 step 2).
    pub fn is_terminal_lifecycle(&self) -> bool {
        matches!(
            self,
            AuditStatus::Completed | AuditStatus::Failed | AuditStatus::Replayed
        )
    }
}

impl From<NodeStatus> for AuditStatus {
    fn from(s: NodeStatus) -> Self {
        match s {
            NodeStatus::Success => AuditStatus::Success,
            NodeStatus::Error => AuditStatus::Error,
        }
    }
}

/// Process lifecycle status (external `ProcessRecord`, spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Draft,
    Deployed,
    Stopped,
}

crate::simple_display! {
    ProcessStatus {
        Draft => "draft",
        Deployed => "deployed",
        Stopped => "stopped",
    }
}

/// Persisted flow document (spec §3 `ProcessRecord`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: String,
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dsl: Value,
    pub status: ProcessStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Secret kind discriminant (spec §3 `SecretRecord`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    BasicAuth,
    Token,
    Certificate,
    ConnectionString,
    AwsCredentials,
    SshKey,
    AmqpUrl,
}

/// Metadata-only view of a secret (never carries the decrypted value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SecretType,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
