// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Activity contract (spec §4.2): `Execute(input, config) -> output`.
//!
//! Activities are re-entrant — the same instance is invoked concurrently
//! across executions — and must treat `config` as read-only.

use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::Value;
use std::collections::HashMap;

/// A node's effective configuration: the DSL-authored `config` map with any
/// resolved `secret_ref` fields merged in under credential-bearing keys.
pub type ActivityConfig = HashMap<String, Value>;

#[async_trait]
pub trait Activity: Send + Sync {
    /// Run the activity. `input` is the node's resolved `input_mapping`
    /// object; `config` must not be mutated.
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError>;

    /// Credential-bearing config keys this activity trusts a resolved
    /// secret to override (spec §4.4 step (b): "only over keys the
    /// activity marks credential-bearing"). Empty by default.
    fn credential_keys(&self) -> &'static [&'static str] {
        &[]
    }
}

pub(crate) fn config_str<'a>(config: &'a ActivityConfig, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}

pub(crate) fn missing_config(activity: &str, key: &str) -> FlowError {
    FlowError::ActivityTransport(format!("{activity} activity requires config.{key}"))
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records calls and returns a fixed output, for exercising the
    /// registry and executor without real IO.
    #[derive(Clone)]
    pub struct FakeActivity {
        output: Value,
        fail: bool,
        calls: Arc<Mutex<Vec<Value>>>,
    }

    impl FakeActivity {
        pub fn succeeding(output: Value) -> Self {
            Self { output, fail: false, calls: Arc::new(Mutex::new(Vec::new())) }
        }

        pub fn failing() -> Self {
            Self { output: Value::Null, fail: true, calls: Arc::new(Mutex::new(Vec::new())) }
        }

        pub fn calls(&self) -> Vec<Value> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Activity for FakeActivity {
        async fn execute(&self, input: Value, _config: &ActivityConfig) -> Result<Value, FlowError> {
            self.calls.lock().push(input);
            if self.fail {
                Err(FlowError::ActivityTransport("fake activity configured to fail".to_string()))
            } else {
                Ok(self.output.clone())
            }
        }
    }
}
