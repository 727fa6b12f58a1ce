// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process Executor (spec §4.4): order resolution over the transition
//! graph, the per-node pipeline (resolve -> secret merge -> retry -> invoke
//! -> record), and error-strategy application.

use crate::secret::SecretResolver;
use flowjs_activities::Registry;
use flowjs_core::{
    exponential_backoff, parse_duration, AuditEvent, AuditSink, AuditStatus, ErrorStrategy, FlowDsl,
    FlowError, FlowResult, Node, NodeFrame, NodeStatus, Persistence, RetryType, Transition,
    TransitionType,
};
use flowjs_dsl::TransitionGraph;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct ProcessExecutor {
    registry: Arc<Registry>,
    secrets: Arc<SecretResolver>,
    audit: Arc<dyn AuditSink>,
}

/// Outcome of [`ProcessExecutor::execute`] / `execute_from_node` (spec §4.4
/// `Execute(dsl, trigger_data) -> (context, error)`).
pub struct ExecutionResult {
    pub execution_id: Uuid,
    pub context: flowjs_core::ExecutionContext,
    pub error: Option<FlowError>,
}

impl ProcessExecutor {
    pub fn new(registry: Arc<Registry>, secrets: Arc<SecretResolver>, audit: Arc<dyn AuditSink>) -> Self {
        Self { registry, secrets, audit }
    }

    pub async fn execute(&self, dsl: &FlowDsl, trigger_data: Value) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let mut ctx = flowjs_core::ExecutionContext::new(execution_id, trigger_data.clone());
        self.emit_lifecycle(dsl, execution_id, AuditStatus::Started, trigger_data, None, 0);

        let start = Instant::now();
        let error = self.run(dsl, &mut ctx, &dsl.trigger.id, None).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let terminal = if error.is_some() { AuditStatus::Failed } else { AuditStatus::Completed };
        self.emit_lifecycle(dsl, execution_id, terminal, Value::Null, error.as_ref().map(FlowError::to_string), duration_ms);

        ExecutionResult { execution_id, context: ctx, error }
    }

    /// Partial replay: re-enters the graph at `node_id`, injecting
    /// `node_input` as that node's pre-resolved input instead of resolving
    /// `input_mapping` against context (spec §4.4 `ExecuteFromNode`).
    pub async fn execute_from_node(
        &self,
        dsl: &FlowDsl,
        node_id: &str,
        node_input: Value,
        correlation_id: Uuid,
    ) -> ExecutionResult {
        let mut ctx = flowjs_core::ExecutionContext::new(correlation_id, Value::Null);
        self.emit_lifecycle(dsl, correlation_id, AuditStatus::Started, Value::Null, None, 0);

        let start = Instant::now();
        let error = self.run(dsl, &mut ctx, node_id, Some(node_input)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.emit_lifecycle(dsl, correlation_id, AuditStatus::Replayed, Value::Null, error.as_ref().map(FlowError::to_string), duration_ms);

        ExecutionResult { execution_id: correlation_id, context: ctx, error }
    }

    /// Lifecycle events are suppressed entirely under `persistence: none`
    /// (spec §3 `Definition.settings.persistence`); replay then has no
    /// recorded trigger payload to recover, which is why the replay
    /// endpoints require persistence to be enabled.
    fn emit_lifecycle(&self, dsl: &FlowDsl, execution_id: Uuid, status: AuditStatus, input: Value, error: Option<String>, duration_ms: u64) {
        if dsl.definition.settings.persistence == Persistence::None {
            return;
        }
        self.audit.emit(AuditEvent::lifecycle(execution_id, &dsl.definition.id, status, input, error, duration_ms));
    }

    async fn run(
        &self,
        dsl: &FlowDsl,
        ctx: &mut flowjs_core::ExecutionContext,
        entry: &str,
        entry_override_input: Option<Value>,
    ) -> Option<FlowError> {
        let nodes_by_id: HashMap<&str, &Node> = dsl.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let graph = TransitionGraph::build(dsl);
        let mut executed: HashSet<String> = HashSet::new();
        let mut process_error: Option<FlowError> = None;

        if graph.is_flat {
            let skip_until = entry_override_input.is_some();
            let mut seen_entry = !skip_until;
            for node_id in graph.node_order() {
                if skip_until && !seen_entry {
                    if node_id == entry {
                        seen_entry = true;
                    } else {
                        continue;
                    }
                }
                let Some(node) = nodes_by_id.get(node_id.as_str()) else { continue };
                let override_input = if seen_entry && node_id == entry { entry_override_input.clone() } else { None };
                let (status, err) = self.run_node(dsl, ctx, node, override_input).await;
                if let NodeStatus::Error = status {
                    if matches!(dsl.definition.settings.error_strategy, ErrorStrategy::StopAndRollback | ErrorStrategy::Retry) {
                        process_error = err;
                        break;
                    }
                }
            }
            return process_error;
        }

        // Iterative DFS: the stack holds node ids still to be run+explored.
        // Pushing a `from`'s qualifying children in reverse declaration
        // order, then popping, reproduces "each fired edge pursued
        // depth-first in the order fired" without recursive self-borrows.
        let mut stack: Vec<String> = Vec::new();
        let mut pending_override = entry_override_input;

        if pending_override.is_some() {
            stack.push(entry.to_string());
        } else {
            self.push_children(dsl, ctx, &graph, dsl.trigger.id.as_str(), NodeStatus::Success, &executed, &mut stack);
        }

        while let Some(node_id) = stack.pop() {
            if process_error.is_some() {
                break;
            }
            if executed.contains(&node_id) {
                continue;
            }
            let Some(node) = nodes_by_id.get(node_id.as_str()).copied() else { continue };
            executed.insert(node_id.clone());

            let override_input = if node_id == entry { pending_override.take() } else { None };
            let (status, err) = self.run_node(dsl, ctx, node, override_input).await;

            if let NodeStatus::Error = status {
                let has_error_edge = graph.edges_from(&node_id).iter().any(|t| t.kind == TransitionType::Error);
                if !has_error_edge {
                    match dsl.definition.settings.error_strategy {
                        ErrorStrategy::StopAndRollback | ErrorStrategy::Retry => {
                            process_error = err;
                            break;
                        }
                        ErrorStrategy::Continue => {}
                    }
                }
            }

            self.push_children(dsl, ctx, &graph, &node_id, status, &executed, &mut stack);
        }

        process_error
    }

    fn push_children(
        &self,
        _dsl: &FlowDsl,
        ctx: &flowjs_core::ExecutionContext,
        graph: &TransitionGraph,
        from: &str,
        from_status: NodeStatus,
        executed: &HashSet<String>,
        stack: &mut Vec<String>,
    ) {
        let edges = graph.edges_from(from);
        let any_condition_fired = edges.iter().any(|t| t.kind == TransitionType::Condition && self.condition_fires(ctx, t));

        let qualifying: Vec<&Transition> = edges
            .iter()
            .filter(|edge| self.edge_fires(ctx, edge, from_status, any_condition_fired))
            .filter(|edge| !executed.contains(&edge.to))
            .collect();
        for edge in qualifying.into_iter().rev() {
            stack.push(edge.to.clone());
        }
    }

    fn edge_fires(&self, ctx: &flowjs_core::ExecutionContext, edge: &Transition, from_status: NodeStatus, any_condition_fired: bool) -> bool {
        match edge.kind {
            TransitionType::Success => from_status == NodeStatus::Success,
            TransitionType::Error => from_status == NodeStatus::Error,
            TransitionType::Condition => self.condition_fires(ctx, edge),
            TransitionType::Nocondition => !any_condition_fired,
        }
    }

    fn condition_fires(&self, ctx: &flowjs_core::ExecutionContext, edge: &Transition) -> bool {
        match &edge.condition {
            Some(expr) => flowjs_core::is_truthy(&ctx.resolve(expr)),
            None => false,
        }
    }

    async fn run_node(
        &self,
        dsl: &FlowDsl,
        ctx: &mut flowjs_core::ExecutionContext,
        node: &Node,
        override_input: Option<Value>,
    ) -> (NodeStatus, Option<FlowError>) {
        let start = Instant::now();
        let input = match override_input {
            Some(v) => v,
            None => ctx.resolve_mapping(&node.input_mapping),
        };

        let result = self.invoke_with_retry(dsl, node, input.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (status, output, error, error_msg) = match result {
            Ok(output) => (NodeStatus::Success, output, None, None),
            Err(e) => (NodeStatus::Error, Value::Null, Some(e.clone()), Some(e.to_string())),
        };

        ctx.set_node(
            node.id.clone(),
            NodeFrame { input: input.clone(), output: output.clone(), status, error: error_msg.clone(), duration_ms },
        );
        if dsl.definition.settings.persistence == Persistence::Full {
            self.audit.emit(AuditEvent {
                execution_id: ctx.execution_id,
                flow_id: dsl.definition.id.clone(),
                node_id: node.id.clone(),
                node_type: node.kind.activity_key().to_string(),
                status: status.into(),
                input,
                output,
                error_msg,
                duration_ms,
                timestamp: chrono::Utc::now(),
            });
        }
        (status, error)
    }

    async fn invoke_with_retry(&self, dsl: &FlowDsl, node: &Node, input: Value) -> FlowResult<Value> {
        let activity = self.registry.resolve(node.kind.activity_key())?;
        let effective_config = self.effective_config(node, activity.credential_keys()).await?;

        let (max_attempts, interval, retry_kind) = match &node.retry_policy {
            Some(policy) => (policy.max_attempts.max(1), policy.interval.clone(), policy.kind),
            None => (1, "0ms".to_string(), RetryType::Fixed),
        };
        let base_interval = parse_duration(&interval).unwrap_or(Duration::ZERO);
        let deadline_ms = self.node_deadline_ms(dsl, node);

        let mut last_err = None;
        for attempt in 0..max_attempts {
            let call = activity.execute(input.clone(), &effective_config);
            let outcome = tokio::time::timeout(Duration::from_millis(deadline_ms), call).await;
            match outcome {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => last_err = Some(e),
                Err(_) => last_err = Some(FlowError::Timeout(Duration::from_millis(deadline_ms))),
            }
            if attempt + 1 < max_attempts {
                let wait = match retry_kind {
                    RetryType::Fixed => base_interval,
                    RetryType::Exponential => exponential_backoff(base_interval, attempt),
                };
                tokio::time::sleep(wait).await;
            }
        }
        Err(last_err.unwrap_or_else(|| FlowError::ActivityTransport("activity failed with no error detail".to_string())))
    }

    async fn effective_config(&self, node: &Node, credential_keys: &[&str]) -> FlowResult<flowjs_activities::ActivityConfig> {
        match &node.secret_ref {
            Some(secret_id) => {
                let fields = self.secrets.resolve(secret_id).await?;
                Ok(SecretResolver::merge_into_config(&node.config, &fields, credential_keys))
            }
            None => Ok(node.config.clone()),
        }
    }

    fn node_deadline_ms(&self, dsl: &FlowDsl, node: &Node) -> u64 {
        let from_config = node.config.get("timeout_ms").and_then(Value::as_u64);
        match from_config {
            Some(ms) => ms.min(dsl.definition.settings.timeout_ms),
            None => dsl.definition.settings.timeout_ms,
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
