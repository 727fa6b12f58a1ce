// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state handed to every axum handler.

use crate::config::Config;
use flowjs_activities::Registry;
use flowjs_engine::{ProcessExecutor, SecretResolver, TriggerManager};
use flowjs_storage::{AuditBatcher, ProcessStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub executor: Arc<ProcessExecutor>,
    pub triggers: Arc<TriggerManager>,
    pub registry: Arc<Registry>,
    pub secrets: Arc<SecretResolver>,
    pub processes: Arc<ProcessStore>,
    pub batcher: Arc<AuditBatcher>,
}
