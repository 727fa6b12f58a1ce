// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::activity::{config_str, missing_config, Activity, ActivityConfig};
use async_trait::async_trait;
use flowjs_core::FlowError;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, Column, Row};

/// `sql`: runs `config.query` against `config.connection_string`
/// (typically resolved from a `connection_string` secret), binding
/// `input.params` positionally. Connects fresh per invocation — activities
/// are re-entrant and stateless by contract (spec §4.2).
pub struct SqlActivity;

#[async_trait]
impl Activity for SqlActivity {
    async fn execute(&self, input: Value, config: &ActivityConfig) -> Result<Value, FlowError> {
        let connection_string =
            config_str(config, "connection_string").ok_or_else(|| missing_config("sql", "connection_string"))?;
        let query = config_str(config, "query").ok_or_else(|| missing_config("sql", "query"))?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(connection_string)
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("sql connect failed: {e}")))?;

        let mut statement = sqlx::query(query);
        if let Some(params) = input.get("params").and_then(Value::as_array) {
            for param in params {
                statement = bind_param(statement, param);
            }
        }

        let rows = statement
            .fetch_all(&pool)
            .await
            .map_err(|e| FlowError::ActivityTransport(format!("sql query failed: {e}")))?;

        let rows: Vec<Value> = rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for column in row.columns() {
                    let value: Option<String> = row.try_get(column.ordinal()).unwrap_or(None);
                    obj.insert(column.name().to_string(), value.map(Value::String).unwrap_or(Value::Null));
                }
                Value::Object(obj)
            })
            .collect();

        Ok(json!({ "rows": rows, "row_count": rows.len() }))
    }

    fn credential_keys(&self) -> &'static [&'static str] {
        &["connection_string"]
    }
}

fn bind_param<'q>(
    statement: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    param: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match param {
        Value::String(s) => statement.bind(s.as_str()),
        Value::Number(n) if n.is_i64() => statement.bind(n.as_i64()),
        Value::Number(n) => statement.bind(n.as_f64()),
        Value::Bool(b) => statement.bind(*b),
        Value::Null => statement.bind(Option::<String>::None),
        other => statement.bind(other.to_string()),
    }
}
