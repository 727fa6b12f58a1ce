// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution Context (spec §4.1): the addressable data model for
//! `$.trigger.*` and `$.nodes.<id>.*`, plus its dot-path resolver.
//!
//! This is deliberately not a JSONPath implementation (design note §9):
//! dot-separated keys, numeric tokens address array indices, anything
//! missing resolves to `null`. Resolution never fails.

use crate::dsl::NodeStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// One node's recorded terminal frame (spec §3 `ExecutionContext.nodes`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFrame {
    pub input: Value,
    pub output: Value,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

/// The in-memory record of one flow run (spec §3, §4.1).
///
/// Owned exclusively by the Executor between node executions; never read
/// concurrently within a single execution (§3 ownership note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub execution_id: Uuid,
    pub trigger: Value,
    pub nodes: HashMap<String, NodeFrame>,
}

impl ExecutionContext {
    pub fn new(execution_id: Uuid, trigger: Value) -> Self {
        Self { execution_id, trigger, nodes: HashMap::new() }
    }

    /// Record a node's terminal frame (spec §4.1 `SetNode`).
    pub fn set_node(&mut self, node_id: impl Into<String>, frame: NodeFrame) {
        self.nodes.insert(node_id.into(), frame);
    }

    /// Set an arbitrary value in `trigger` by dot-path (spec §4.1 `Set`).
    ///
    /// Only `$.trigger...` paths are mutable this way; `$.nodes...` is
    /// mutated exclusively through [`Self::set_node`].
    pub fn set(&mut self, path: &str, value: Value) {
        let Some(rest) = path.strip_prefix("$.trigger") else { return };
        let steps = split_steps(rest.trim_start_matches('.'));
        if steps.is_empty() {
            self.trigger = value;
            return;
        }
        set_by_path(&mut self.trigger, &steps, value);
    }

    /// Resolve a `$.trigger.*` or `$.nodes.<id>.*` expression (spec §4.1 `Resolve`).
    ///
    /// Never throws: missing intermediate or terminal keys resolve to `null`.
    pub fn resolve(&self, expression: &str) -> Value {
        let Some(rest) = expression.strip_prefix("$.") else {
            return Value::Null;
        };
        let steps = split_steps(rest);
        if steps.is_empty() {
            return Value::Null;
        }
        match steps[0].as_str() {
            "trigger" => get_by_path(&self.trigger, &steps[1..]),
            "nodes" => {
                let Some(node_id) = steps.get(1) else { return Value::Null };
                let Some(frame) = self.nodes.get(node_id) else { return Value::Null };
                if steps.len() == 2 {
                    return serde_json::to_value(frame).unwrap_or(Value::Null);
                }
                match steps[2].as_str() {
                    "input" => get_by_path(&frame.input, &steps[3..]),
                    "output" => get_by_path(&frame.output, &steps[3..]),
                    "status" => Value::String(frame.status.to_string()),
                    "error" => frame.error.clone().map(Value::String).unwrap_or(Value::Null),
                    "duration_ms" => Value::Number(frame.duration_ms.into()),
                    _ => Value::Null,
                }
            }
            _ => Value::Null,
        }
    }

    /// Resolve an `input_mapping` (spec §4.1 "Input mapping semantics").
    ///
    /// Each key of `mapping` holds either an expression string (resolved
    /// against this context), a nested map (resolved recursively), or a
    /// literal value (passed through verbatim).
    pub fn resolve_mapping(&self, mapping: &HashMap<String, Value>) -> Value {
        let mut out = serde_json::Map::with_capacity(mapping.len());
        for (key, value) in mapping {
            out.insert(key.clone(), self.resolve_value(value));
        }
        Value::Object(out)
    }

    fn resolve_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) if s.starts_with("$.") => self.resolve(s),
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_value(v));
                }
                Value::Object(out)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.resolve_value(v)).collect())
            }
            other => other.clone(),
        }
    }

    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Truthiness rule for `condition` transitions (spec §4.4): numbers != 0,
/// non-empty strings/maps/arrays, boolean true. `null` and missing are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn split_steps(path: &str) -> Vec<String> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').map(|s| s.to_string()).collect()
    }
}

fn get_by_path(value: &Value, steps: &[String]) -> Value {
    let mut current = value;
    for step in steps {
        current = match current {
            Value::Object(map) => match map.get(step) {
                Some(v) => v,
                None => return Value::Null,
            },
            Value::Array(items) => match step.parse::<usize>() {
                Ok(idx) => match items.get(idx) {
                    Some(v) => v,
                    None => return Value::Null,
                },
                Err(_) => return Value::Null,
            },
            _ => return Value::Null,
        };
    }
    current.clone()
}

fn set_by_path(root: &mut Value, steps: &[String], value: Value) {
    if steps.is_empty() {
        *root = value;
        return;
    }
    if !root.is_object() {
        *root = Value::Object(serde_json::Map::new());
    }
    let map = root.as_object_mut().expect("set to Object above");
    if steps.len() == 1 {
        map.insert(steps[0].clone(), value);
        return;
    }
    let entry = map.entry(steps[0].clone()).or_insert(Value::Object(serde_json::Map::new()));
    set_by_path(entry, &steps[1..], value);
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
