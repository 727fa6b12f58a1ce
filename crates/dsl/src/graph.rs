// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transition graph the Process Executor walks (spec §4.4 "Order
//! resolution"): edges keyed by `from`, in declaration order.

use flowjs_core::{FlowDsl, Transition, TransitionType};
use std::collections::HashMap;

/// Transitions grouped by `from`, preserving declaration order within each group.
#[derive(Debug, Clone)]
pub struct TransitionGraph {
    by_from: HashMap<String, Vec<Transition>>,
    /// True when the DSL declared no transitions at all — the executor
    /// falls back to declared-order traversal (spec §4.4 "flat DSL").
    pub is_flat: bool,
    node_order: Vec<String>,
}

impl TransitionGraph {
    pub fn build(dsl: &FlowDsl) -> Self {
        let mut by_from: HashMap<String, Vec<Transition>> = HashMap::new();
        for t in &dsl.transitions {
            by_from.entry(t.from.clone()).or_default().push(t.clone());
        }
        Self {
            is_flat: dsl.transitions.is_empty(),
            by_from,
            node_order: dsl.nodes.iter().map(|n| n.id.clone()).collect(),
        }
    }

    /// Declaration order of all nodes, used for the flat-DSL fallback.
    pub fn node_order(&self) -> &[String] {
        &self.node_order
    }

    /// Outgoing edges from `from`, in declaration order.
    pub fn edges_from(&self, from: &str) -> &[Transition] {
        self.by_from.get(from).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether `from` has at least one `condition` sibling transition.
    pub fn has_condition_sibling(&self, from: &str) -> bool {
        self.edges_from(from).iter().any(|t| t.kind == TransitionType::Condition)
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
