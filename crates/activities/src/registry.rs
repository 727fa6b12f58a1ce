// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity Registry (spec §4.2): `node_type -> Activity`, trait-object
//! keyed the way `oj-adapters`' agent registry maps kind to handler.

use crate::activity::Activity;
use crate::builtin;
use flowjs_core::FlowError;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct Registry {
    activities: HashMap<String, Arc<dyn Activity>>,
}

impl Registry {
    pub fn empty() -> Self {
        Self { activities: HashMap::new() }
    }

    /// Registry wired with every built-in except `script_ts`/`code`, whose
    /// sandbox lives in `flowjs-engine` and is registered by its caller.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("logger", Arc::new(builtin::logger::LoggerActivity));
        registry.register("log", Arc::new(builtin::logger::LoggerActivity));
        registry.register("http", Arc::new(builtin::http::HttpActivity::new()));
        registry.register("sql", Arc::new(builtin::sql::SqlActivity));
        registry.register("mail", Arc::new(builtin::mail::MailActivity::new()));
        registry.register("sftp", Arc::new(builtin::sftp::SftpActivity));
        registry.register("s3", Arc::new(builtin::s3::S3Activity));
        registry.register("smb", Arc::new(builtin::smb::SmbActivity));
        registry.register("rabbitmq", Arc::new(builtin::rabbitmq::RabbitMqActivity));
        registry.register("transform", Arc::new(builtin::transform::TransformActivity));
        registry.register("file", Arc::new(builtin::file::FileActivity));
        registry
    }

    pub fn register(&mut self, node_type: impl Into<String>, activity: Arc<dyn Activity>) {
        self.activities.insert(node_type.into(), activity);
    }

    /// Look up the activity for `node_type` (spec §4.2 `activity_key()`),
    /// surfacing the `unknown_activity` edge case as [`FlowError::UnknownActivity`].
    pub fn resolve(&self, node_type: &str) -> Result<Arc<dyn Activity>, FlowError> {
        self.activities
            .get(node_type)
            .cloned()
            .ok_or_else(|| FlowError::UnknownActivity(node_type.to_string()))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
