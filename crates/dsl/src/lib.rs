// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! flowjs-dsl: parsing and structural validation of the FlowDSL JSON
//! document (spec §3), id conventions (§6), and the transition graph the
//! Process Executor walks (§4.4).

pub mod graph;
pub mod ids;
pub mod validate;

pub use flowjs_core::FlowDsl;
pub use graph::TransitionGraph;

use flowjs_core::{FlowError, FlowResult};

/// Parse and structurally validate a FlowDSL document (spec §3.1).
///
/// Deserialization failures surface as [`FlowError::InvalidDsl`] with serde's
/// message; invariant violations surface the same variant from [`validate::validate`].
pub fn parse(raw: &str) -> FlowResult<FlowDsl> {
    let dsl: FlowDsl = serde_json::from_str(raw)
        .map_err(|e| FlowError::InvalidDsl(format!("malformed FlowDSL document: {e}")))?;
    validate::validate(&dsl)?;
    Ok(dsl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_json() {
        assert!(parse("not json").is_err());
    }

    #[test]
    fn parses_and_validates_minimal_flow() {
        let raw = r#"{
            "definition": {
                "id": "hello-world",
                "version": 1,
                "name": "Hello World",
                "settings": { "timeout_ms": 5000 }
            },
            "trigger": { "id": "trg_manual", "type": "manual" },
            "nodes": [
                { "id": "say_hello", "type": "logger", "config": { "message": "hi" } }
            ],
            "transitions": [
                { "from": "trg_manual", "to": "say_hello", "type": "success" }
            ]
        }"#;
        let dsl = parse(raw).expect("valid flow");
        assert_eq!(dsl.nodes.len(), 1);
        let graph = TransitionGraph::build(&dsl);
        assert!(!graph.is_flat);
        assert_eq!(graph.edges_from("trg_manual").len(), 1);
    }

    #[test]
    fn rejects_flow_violating_invariants() {
        let raw = r#"{
            "definition": {
                "id": "broken",
                "version": 1,
                "name": "Broken",
                "settings": { "timeout_ms": 5000 }
            },
            "trigger": { "id": "trg_manual", "type": "manual" },
            "nodes": [
                { "id": "a", "type": "logger" },
                { "id": "a", "type": "logger" }
            ],
            "transitions": []
        }"#;
        assert!(parse(raw).is_err());
    }
}
