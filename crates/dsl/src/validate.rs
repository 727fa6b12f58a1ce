// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural invariants I1-I6 (spec §3.1 "Invariants").
//!
//! `parse` in [`crate::parse`] calls this after deserializing a `FlowDsl`;
//! nothing downstream (the executor, the trigger manager) re-checks these.

use crate::ids::{validate_node_id, validate_trigger_id};
use flowjs_core::{FlowDsl, FlowError, FlowResult};
use std::collections::HashSet;

/// Keys that look like raw credential material when present directly on a
/// node's `config`, rather than behind `secret_ref` (I6).
const CREDENTIAL_LOOKING_KEYS: &[&str] = &[
    "password", "passwd", "secret", "api_key", "apikey", "access_key",
    "access_key_id", "secret_access_key", "private_key", "token",
    "client_secret", "auth_token",
];

pub fn validate(dsl: &FlowDsl) -> FlowResult<()> {
    validate_trigger_id(&dsl.trigger.id)?;

    validate_unique_and_disjoint_ids(dsl)?;
    validate_transitions_reference_known_nodes(dsl)?;
    validate_inbound_transitions(dsl)?;
    validate_input_mappings(dsl)?;
    validate_no_raw_credentials(dsl)?;

    Ok(())
}

/// I2: node ids are unique and well-formed, and none collides with the trigger id.
fn validate_unique_and_disjoint_ids(dsl: &FlowDsl) -> FlowResult<()> {
    let mut seen = HashSet::with_capacity(dsl.nodes.len());
    for node in &dsl.nodes {
        validate_node_id(&node.id)?;
        if node.id == dsl.trigger.id {
            return Err(FlowError::InvalidDsl(format!(
                "node id {:?} collides with the trigger id",
                node.id
            )));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(FlowError::InvalidDsl(format!("duplicate node id {:?}", node.id)));
        }
    }
    Ok(())
}

/// I3: every transition's `from`/`to` names the trigger or a declared node.
fn validate_transitions_reference_known_nodes(dsl: &FlowDsl) -> FlowResult<()> {
    let node_ids: HashSet<&str> = dsl.nodes.iter().map(|n| n.id.as_str()).collect();
    let known = |id: &str| id == dsl.trigger.id || node_ids.contains(id);
    for t in &dsl.transitions {
        if !known(&t.from) {
            return Err(FlowError::InvalidDsl(format!(
                "transition `from` {:?} references no trigger or node",
                t.from
            )));
        }
        if !known(&t.to) {
            return Err(FlowError::InvalidDsl(format!(
                "transition `to` {:?} references no trigger or node",
                t.to
            )));
        }
    }
    Ok(())
}

/// I4: when any transitions are declared, every non-trigger node has at
/// least one inbound edge. A flat DSL (no transitions at all) is exempt —
/// the executor falls back to declaration order.
fn validate_inbound_transitions(dsl: &FlowDsl) -> FlowResult<()> {
    if dsl.transitions.is_empty() {
        return Ok(());
    }
    let has_inbound: HashSet<&str> = dsl.transitions.iter().map(|t| t.to.as_str()).collect();
    for node in &dsl.nodes {
        if !has_inbound.contains(node.id.as_str()) {
            return Err(FlowError::InvalidDsl(format!(
                "node {:?} has no inbound transition",
                node.id
            )));
        }
    }
    Ok(())
}

/// I5: `input_mapping` expression strings must be well-formed `$.trigger.*`
/// or `$.nodes.<id>.*` paths. Non-expression values (literals, nested maps)
/// are left alone here; [`crate::ids`] doesn't police literal payloads.
fn validate_input_mappings(dsl: &FlowDsl) -> FlowResult<()> {
    for node in &dsl.nodes {
        for (key, value) in &node.input_mapping {
            validate_mapping_value(&node.id, key, value)?;
        }
    }
    Ok(())
}

fn validate_mapping_value(node_id: &str, key: &str, value: &serde_json::Value) -> FlowResult<()> {
    match value {
        serde_json::Value::String(s) if s.starts_with("$.") => validate_expression(node_id, key, s),
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                validate_mapping_value(node_id, k, v)?;
            }
            Ok(())
        }
        serde_json::Value::Array(items) => {
            for v in items {
                validate_mapping_value(node_id, key, v)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_expression(node_id: &str, key: &str, expr: &str) -> FlowResult<()> {
    let rest = expr.strip_prefix("$.").unwrap_or(expr);
    let mut steps = rest.split('.');
    match steps.next() {
        Some("trigger") => Ok(()),
        Some("nodes") => {
            if steps.next().is_some() {
                Ok(())
            } else {
                Err(malformed_expression(node_id, key, expr))
            }
        }
        _ => Err(malformed_expression(node_id, key, expr)),
    }
}

fn malformed_expression(node_id: &str, key: &str, expr: &str) -> FlowError {
    FlowError::InvalidDsl(format!(
        "node {node_id:?} input_mapping[{key:?}] = {expr:?} is not a well-formed $.trigger.* or $.nodes.<id>.* expression"
    ))
}

/// I6: no raw credential-looking keys directly in `config` — they belong
/// behind `secret_ref`.
fn validate_no_raw_credentials(dsl: &FlowDsl) -> FlowResult<()> {
    for node in &dsl.nodes {
        for key in node.config.keys() {
            let lowered = key.to_ascii_lowercase();
            if CREDENTIAL_LOOKING_KEYS.contains(&lowered.as_str()) {
                return Err(FlowError::InvalidDsl(format!(
                    "node {:?} config carries raw credential key {:?}; use secret_ref instead",
                    node.id, key
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
