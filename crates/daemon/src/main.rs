// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use flowjs_activities::Registry;
use flowjs_daemon::http;
use flowjs_daemon::{AppState, Config};
use flowjs_engine::{ProcessExecutor, ScriptSandbox, SecretResolver, TriggerManager};
use flowjs_storage::{AuditBatcher, PostgresSecretStore, ProcessStore};
use flowjs_wire::AuditSubscriber;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    // 1. Load configuration from the environment.
    let config = Arc::new(Config::from_env()?);

    // 2. Bring up Postgres and apply the schema.
    let pool = flowjs_storage::connect_with_retry(&config.database_url).await?;
    flowjs_storage::run_migrations(&pool).await?;
    info!("postgres ready, schema applied");

    // 3. Wire the Activity Registry, including the script sandbox, which
    // lives in flowjs-engine rather than flowjs-activities.
    let mut registry = Registry::with_builtins();
    registry.register("script_ts", Arc::new(ScriptSandbox::new()));
    registry.register("code", Arc::new(ScriptSandbox::new()));
    let registry = Arc::new(registry);

    // 4. Secret Resolver, backed by Postgres.
    let secret_store = Arc::new(PostgresSecretStore::new(pool.clone()));
    let secrets = Arc::new(SecretResolver::new(secret_store, &config.secrets_aes_key));

    // 5. Audit Batcher, flushing into Postgres via the Audit Persister.
    let flush_fn = flowjs_storage::build_flush_fn(pool.clone());
    let batcher = Arc::new(AuditBatcher::new(
        flowjs_storage::DEFAULT_MAX_BATCH_SIZE,
        flowjs_storage::DEFAULT_FLUSH_INTERVAL,
        flush_fn,
    ));
    let audit_sink: Arc<dyn flowjs_core::AuditSink> = Arc::new(flowjs_storage::BatcherSink::new(batcher.clone()));

    // 6. Process Executor and Trigger Manager.
    let executor = Arc::new(ProcessExecutor::new(registry.clone(), secrets.clone(), audit_sink));
    let triggers = Arc::new(TriggerManager::new(executor.clone()));
    let processes = Arc::new(ProcessStore::new(pool.clone()));

    // 7. Connect to NATS and start the Audit Subscriber, forwarding decoded
    // events into the same Batcher the Executor's sink writes through.
    let nats_client = flowjs_wire::connect(&config.nats_url).await?;
    let subscriber = Arc::new(AuditSubscriber::new(nats_client, batcher.clone()));
    let subscriber_task = {
        let subscriber = subscriber.clone();
        tokio::spawn(async move {
            if let Err(e) = subscriber.run().await {
                tracing::error!(error = %e, "audit subscriber loop exited with an error");
            }
        })
    };

    // 8. Redeploy every process already marked `deployed`, so a daemon
    // restart resumes their triggers.
    for record in processes.list().await? {
        if record.status == flowjs_core::ProcessStatus::Deployed {
            match flowjs_dsl::parse(&serde_json::to_string(&record.dsl)?) {
                Ok(dsl) => {
                    if let Err(e) = triggers.deploy(Arc::new(dsl)).await {
                        tracing::warn!(process_id = %record.id, error = %e, "failed to restart deployed process");
                    }
                }
                Err(e) => tracing::warn!(process_id = %record.id, error = %e, "stored DSL failed to parse on startup"),
            }
        }
    }

    // 9. Serve HTTP until a shutdown signal arrives.
    let state = AppState { config: config.clone(), pool, executor, triggers, registry, secrets, processes, batcher };
    let app = http::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "flowjsd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(flowjs_daemon::shutdown::wait_for_signal())
        .await?;

    flowjs_daemon::shutdown::run(state, subscriber).await;
    subscriber_task.abort();

    Ok(())
}
