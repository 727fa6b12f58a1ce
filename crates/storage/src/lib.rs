// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence: the Audit Batcher (C7), Audit Persister (C8), schema
//! migrations, and the Postgres-backed `SecretStore`/`ProcessStore`
//! implementations (spec §4.7, §4.8, §6).

pub mod batcher;
pub mod migrations;
pub mod persister;
pub mod process_store;
pub mod secret_store;

pub use batcher::{AuditBatcher, BatcherSink, FlushFn, FlushFuture, DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_BATCH_SIZE};
pub use migrations::run_migrations;
pub use persister::{batch_insert_logs, build_flush_fn, connect_with_retry};
pub use process_store::ProcessStore;
pub use secret_store::PostgresSecretStore;
