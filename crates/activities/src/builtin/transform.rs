// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::Value;

/// `transform`: passes `input` through verbatim. Real shaping happens
/// upstream via `input_mapping`; this activity exists so a flow can record
/// an explicit "reshape" step in its audit trail without scripting.
pub struct TransformActivity;

#[async_trait]
impl Activity for TransformActivity {
    async fn execute(&self, input: Value, _config: &ActivityConfig) -> Result<Value, FlowError> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn passes_input_through() {
        let activity = TransformActivity;
        let input = json!({"a": 1});
        let out = activity.execute(input.clone(), &HashMap::new()).await.unwrap();
        assert_eq!(out, input);
    }
}
