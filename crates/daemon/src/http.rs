// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface (spec §6): flow execution, process CRUD/lifecycle, secret
//! metadata, and the `/triggers/*` and `/soap/*` catch-alls the Trigger
//! Manager's registered routes dispatch through.

use crate::state::AppState;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, delete, get, post};
use axum::{BoxError, Json, Router};
use flowjs_core::{FlowError, Persistence, ProcessRecord, ProcessStatus, SecretType};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError(StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;
    let middleware = ServiceBuilder::new().layer(HandleErrorLayer::new(handle_timeout)).timeout(request_timeout);

    Router::new()
        .route("/health", get(health))
        .route("/v1/flow", post(run_flow))
        .route("/v1/test", post(test_node))
        .route("/api/v1/processes", get(list_processes).post(create_process))
        .route("/api/v1/processes/:id", get(get_process).delete(delete_process))
        .route("/api/v1/processes/:id/deploy", post(deploy_process))
        .route("/api/v1/processes/:id/stop", post(stop_process))
        .route("/api/v1/processes/:id/replay", post(replay_process))
        .route("/api/v1/processes/:id/replay-from/:node_id", post(replay_from_node))
        .route("/api/v1/secrets", get(list_secrets).post(upsert_secret))
        .route("/api/v1/secrets/:id", delete(delete_secret))
        .route("/triggers/*path", any(dispatch_rest_trigger))
        .route("/soap/*path", any(dispatch_soap_trigger))
        .layer(TraceLayer::new_for_http())
        .layer(middleware)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

/// HTTP status mapping (spec §7): 400 validation, 404 not found, 422
/// execution failure, 500 internal, 503 store unconfigured.
impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        let status = match &err {
            FlowError::InvalidDsl(_) => StatusCode::BAD_REQUEST,
            FlowError::UnknownActivity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::InputResolution(_) | FlowError::SecretResolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::ActivityTransport(_) | FlowError::Timeout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::ScriptSyntaxError(_) | FlowError::ScriptRuntimeError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::PersistenceError(_) => StatusCode::SERVICE_UNAVAILABLE,
            FlowError::TriggerStartFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

fn not_found(what: impl Into<String>) -> ApiError {
    ApiError(StatusCode::NOT_FOUND, what.into())
}

#[derive(Deserialize)]
struct RunFlowRequest {
    dsl: Value,
    #[serde(default)]
    trigger_data: Value,
}

async fn run_flow(State(state): State<AppState>, Json(req): Json<RunFlowRequest>) -> Response {
    let dsl = match parse_dsl(&req.dsl) {
        Ok(dsl) => dsl,
        Err(e) => return ApiError::from(e).into_response(),
    };
    let result = state.executor.execute(&dsl, req.trigger_data).await;
    let status = if result.error.is_some() { StatusCode::UNPROCESSABLE_ENTITY } else { StatusCode::OK };
    (status, Json(json!({
        "execution_id": result.execution_id,
        "nodes": result.context.nodes,
        "error": result.error.map(|e| e.to_string()),
    })))
        .into_response()
}

#[derive(Deserialize)]
struct TestNodeRequest {
    #[serde(default)]
    node_type: Option<String>,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    input_mapping: Option<HashMap<String, Value>>,
    input_payload: Value,
    #[serde(default)]
    config: Option<HashMap<String, Value>>,
}

/// `/v1/test`: single-node-in-isolation execution (spec §6). `$.trigger`
/// is `input_payload`; `input_mapping`, if given, resolves against it the
/// same way a deployed node's mapping would.
async fn test_node(State(state): State<AppState>, Json(req): Json<TestNodeRequest>) -> Response {
    let ctx = flowjs_core::ExecutionContext::new(Uuid::new_v4(), req.input_payload.clone());
    let input = match &req.input_mapping {
        Some(mapping) => ctx.resolve_mapping(mapping),
        None => req.input_payload,
    };

    let node_type = req.node_type.unwrap_or_else(|| "script_ts".to_string());
    let mut config = req.config.unwrap_or_default();
    if let Some(script) = req.script {
        config.insert("script".to_string(), json!(script));
    }

    let activity = match state.registry.resolve(&node_type) {
        Ok(activity) => activity,
        Err(e) => return ApiError::from(e).into_response(),
    };
    match activity.execute(input, &config).await {
        Ok(output) => Json(json!({ "output": output })).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn list_processes(State(state): State<AppState>) -> Result<Json<Vec<ProcessRecord>>, ApiError> {
    Ok(Json(state.processes.list().await?))
}

#[derive(Deserialize)]
struct CreateProcessRequest {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    dsl: Value,
}

async fn create_process(State(state): State<AppState>, Json(req): Json<CreateProcessRequest>) -> Result<Json<ProcessRecord>, ApiError> {
    parse_dsl(&req.dsl)?;
    let now = chrono::Utc::now();
    let record = ProcessRecord {
        id: req.id,
        version: 1,
        name: req.name,
        description: req.description,
        dsl: req.dsl,
        status: ProcessStatus::Draft,
        created_at: now,
        updated_at: now,
    };
    state.processes.upsert(&record).await?;
    Ok(Json(record))
}

async fn get_process(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ProcessRecord>, ApiError> {
    state.processes.get(&id).await?.map(Json).ok_or_else(|| not_found(format!("no such process {id}")))
}

async fn delete_process(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.triggers.stop(&id).await;
    state.processes.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deploy_process(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let record = state.processes.get(&id).await?.ok_or_else(|| not_found(format!("no such process {id}")))?;
    let dsl = parse_dsl(&record.dsl)?;
    state.triggers.deploy(Arc::new(dsl)).await?;
    state.processes.set_status(&id, ProcessStatus::Deployed).await?;
    Ok(Json(json!({ "id": id, "status": "deployed" })))
}

async fn stop_process(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    state.triggers.stop(&id).await;
    state.processes.set_status(&id, ProcessStatus::Stopped).await?;
    Ok(Json(json!({ "id": id, "status": "stopped" })))
}

/// Re-runs `Execute` using the triggering payload recovered from the
/// execution's `started` audit event (spec §6, §4.4 `ExecuteFromNode`/`Execute`
/// replay pair); requires `persistence != none` on the deployed process.
async fn replay_process(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let record = state.processes.get(&id).await?.ok_or_else(|| not_found(format!("no such process {id}")))?;
    let dsl = parse_dsl(&record.dsl)?;
    if dsl.definition.settings.persistence == Persistence::None {
        return Err(FlowError::PersistenceError(format!("process {id} has persistence: none; nothing to replay")).into());
    }

    let execution_id: Uuid = sqlx::query_scalar(
        "SELECT execution_id FROM executions WHERE flow_id = $1 ORDER BY start_time DESC LIMIT 1",
    )
    .bind(&id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| FlowError::PersistenceError(e.to_string()))?
    .ok_or_else(|| not_found(format!("no recorded execution for process {id}")))?;

    let trigger_data: Option<Value> = sqlx::query_scalar(
        "SELECT input_data FROM activity_logs WHERE execution_id = $1 AND node_type = 'process' AND status = 'STARTED' \
         ORDER BY created_at LIMIT 1",
    )
    .bind(execution_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| FlowError::PersistenceError(e.to_string()))?
    .flatten();
    let trigger_data = trigger_data.ok_or_else(|| {
        FlowError::PersistenceError(format!("execution {execution_id} has no recorded trigger payload"))
    })?;

    let result = state.executor.execute(&dsl, trigger_data).await;
    Ok(Json(json!({
        "execution_id": result.execution_id,
        "nodes": result.context.nodes,
        "error": result.error.map(|e| e.to_string()),
    })))
}

#[derive(Deserialize)]
struct ReplayFromNodeRequest {
    #[serde(default)]
    node_input: Option<Value>,
}

/// Re-enters the graph at `node_id`, loading the node's prior output from
/// `activity_logs` as its injected input when the caller supplies none
/// (spec §6 `replay-from`).
async fn replay_from_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
    Json(req): Json<ReplayFromNodeRequest>,
) -> Result<Json<Value>, ApiError> {
    let record = state.processes.get(&id).await?.ok_or_else(|| not_found(format!("no such process {id}")))?;
    let dsl = parse_dsl(&record.dsl)?;
    if dsl.definition.settings.persistence == Persistence::None {
        return Err(FlowError::PersistenceError(format!("process {id} has persistence: none; nothing to replay")).into());
    }

    let node_input = match req.node_input {
        Some(v) => v,
        None => {
            let output: Option<Value> = sqlx::query_scalar(
                "SELECT output_data FROM activity_logs al JOIN executions e ON e.execution_id = al.execution_id \
                 WHERE e.flow_id = $1 AND al.node_id = $2 ORDER BY al.created_at DESC LIMIT 1",
            )
            .bind(&id)
            .bind(&node_id)
            .fetch_optional(&state.pool)
            .await
            .map_err(|e| FlowError::PersistenceError(e.to_string()))?
            .flatten();
            output.ok_or_else(|| FlowError::PersistenceError(format!("no recorded output for node {node_id}")))?
        }
    };

    let correlation_id = Uuid::new_v4();
    let result = state.executor.execute_from_node(&dsl, &node_id, node_input, correlation_id).await;
    Ok(Json(json!({
        "execution_id": result.execution_id,
        "nodes": result.context.nodes,
        "error": result.error.map(|e| e.to_string()),
    })))
}

async fn list_secrets(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(json!(state.secrets.list().await?)))
}

#[derive(Deserialize)]
struct UpsertSecretRequest {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: SecretType,
    fields: HashMap<String, Value>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

async fn upsert_secret(State(state): State<AppState>, Json(req): Json<UpsertSecretRequest>) -> Result<StatusCode, ApiError> {
    state.secrets.upsert(&req.id, &req.name, req.kind, &req.fields, req.metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_secret(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.secrets.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn dispatch_rest_trigger(State(state): State<AppState>, method: Method, Path(path): Path<String>, body: Json<Value>) -> Response {
    let full_path = format!("/{path}");
    let Some(dsl) = state.triggers.dsl_for_rest_route(method.as_str(), &full_path) else {
        return not_found(format!("no rest trigger registered for {method} {full_path}")).into_response();
    };
    let trigger_data = json!({ "payload": body.0, "method": method.as_str(), "path": full_path });
    let result = state.executor.execute(&dsl, trigger_data).await;
    let status = if result.error.is_some() { StatusCode::UNPROCESSABLE_ENTITY } else { StatusCode::OK };
    (status, Json(json!({ "execution_id": result.execution_id, "nodes": result.context.nodes, "error": result.error.map(|e| e.to_string()) })))
        .into_response()
}

async fn dispatch_soap_trigger(State(state): State<AppState>, Path(path): Path<String>, body: String) -> Response {
    let full_path = format!("/{path}");
    let Some(dsl) = state.triggers.dsl_for_soap_path(&full_path) else {
        return not_found(format!("no soap trigger registered for {full_path}")).into_response();
    };
    let fields = parse_soap_envelope_body(&body);
    let trigger_data = json!({ "body": fields, "path": full_path });
    let result = state.executor.execute(&dsl, trigger_data).await;
    let status = if result.error.is_some() { StatusCode::UNPROCESSABLE_ENTITY } else { StatusCode::OK };
    (status, Json(json!({ "execution_id": result.execution_id, "nodes": result.context.nodes, "error": result.error.map(|e| e.to_string()) })))
        .into_response()
}

/// Unwraps a SOAP envelope down to its `Body` element, parsed into a flat
/// map of child tag name to text content (spec §6 `soap` trigger:
/// "body is the envelope's body element parsed into a map"). Unknown or
/// malformed XML yields an empty map rather than failing the request —
/// the flow itself decides whether an empty body is an error.
fn parse_soap_envelope_body(envelope: &str) -> HashMap<String, Value> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(envelope);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut fields = HashMap::new();
    let mut in_body = false;
    let mut depth_in_body = 0u32;
    let mut current_key: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(e.name().as_ref());
                if !in_body && name.eq_ignore_ascii_case("Body") {
                    in_body = true;
                } else if in_body {
                    depth_in_body += 1;
                    if depth_in_body == 1 {
                        current_key = Some(name);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(key) = &current_key {
                    if let Ok(text) = text.unescape() {
                        let text = text.trim();
                        if !text.is_empty() {
                            fields.insert(key.clone(), Value::String(text.to_string()));
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.name().as_ref());
                if in_body && depth_in_body == 0 && name.eq_ignore_ascii_case("Body") {
                    in_body = false;
                } else if in_body && depth_in_body > 0 {
                    depth_in_body -= 1;
                    if depth_in_body == 0 {
                        current_key = None;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    fields
}

fn local_name(qname: &[u8]) -> String {
    let local = qname.rsplit(|&b| b == b':').next().unwrap_or(qname);
    String::from_utf8_lossy(local).into_owned()
}

fn parse_dsl(raw: &Value) -> Result<flowjs_core::FlowDsl, FlowError> {
    let raw = serde_json::to_string(raw).map_err(|e| FlowError::InvalidDsl(e.to_string()))?;
    flowjs_dsl::parse(&raw)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
