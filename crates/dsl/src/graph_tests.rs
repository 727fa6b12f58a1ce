// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowjs_core::{Definition, FlowDsl, Node, NodeType, Persistence, Settings, ErrorStrategy, Trigger, TriggerType};
use std::collections::HashMap;

fn node(id: &str) -> Node {
    Node {
        id: id.to_string(),
        kind: NodeType::Log,
        description: None,
        input_mapping: HashMap::new(),
        config: HashMap::new(),
        secret_ref: None,
        retry_policy: None,
        next: None,
        script: None,
    }
}

fn transition(from: &str, to: &str, kind: TransitionType) -> Transition {
    Transition {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        condition: None,
    }
}

fn dsl_with(nodes: Vec<Node>, transitions: Vec<Transition>) -> FlowDsl {
    FlowDsl {
        definition: Definition {
            id: "p".to_string(),
            version: 1,
            name: "p".to_string(),
            description: None,
            settings: Settings {
                persistence: Persistence::Full,
                timeout_ms: 1000,
                error_strategy: ErrorStrategy::StopAndRollback,
            },
        },
        trigger: Trigger {
            id: "trg_1".to_string(),
            kind: TriggerType::Manual,
            config: HashMap::new(),
        },
        nodes,
        transitions,
    }
}

#[test]
fn empty_transitions_is_flat() {
    let dsl = dsl_with(vec![node("a"), node("b")], vec![]);
    let g = TransitionGraph::build(&dsl);
    assert!(g.is_flat);
    assert_eq!(g.node_order(), &["a".to_string(), "b".to_string()]);
}

#[test]
fn groups_edges_by_from_in_declaration_order() {
    let dsl = dsl_with(
        vec![node("a"), node("b"), node("c")],
        vec![
            transition("a", "b", TransitionType::Success),
            transition("a", "c", TransitionType::Error),
        ],
    );
    let g = TransitionGraph::build(&dsl);
    assert!(!g.is_flat);
    let edges = g.edges_from("a");
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].to, "b");
    assert_eq!(edges[1].to, "c");
    assert!(g.edges_from("b").is_empty());
}

#[test]
fn detects_condition_siblings() {
    let dsl = dsl_with(
        vec![node("a"), node("b"), node("c")],
        vec![
            transition("a", "b", TransitionType::Condition),
            transition("a", "c", TransitionType::Nocondition),
        ],
    );
    let g = TransitionGraph::build(&dsl);
    assert!(g.has_condition_sibling("a"));
    assert!(!g.has_condition_sibling("b"));
}
