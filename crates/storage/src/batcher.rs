// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit Batcher (spec §4.7): accumulates audit events and flushes on
//! size, on a periodic tick, or on shutdown.

use flowjs_core::{AuditEvent, FlowResult};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

pub type FlushFuture = Pin<Box<dyn Future<Output = FlowResult<()>> + Send>>;
pub type FlushFn = Arc<dyn Fn(Vec<AuditEvent>) -> FlushFuture + Send + Sync>;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

struct Inner {
    max_batch_size: usize,
    buffer: Mutex<Vec<AuditEvent>>,
    flush_fn: FlushFn,
}

impl Inner {
    async fn flush_if_nonempty(&self) {
        let batch = {
            let mut buffer = self.buffer.lock();
            if buffer.is_empty() {
                return;
            }
            std::mem::replace(&mut *buffer, Vec::with_capacity(self.max_batch_size))
        };
        if let Err(e) = (self.flush_fn)(batch).await {
            tracing::warn!(error = %e, "audit batch flush failed, events dropped");
        }
    }
}

/// `Add`/`Stop` surface from spec §4.7. Cheaply cloned; the ticker loop
/// holds its own handle onto the same buffer.
pub struct AuditBatcher {
    inner: Arc<Inner>,
    ticker_stop: Arc<Notify>,
    ticker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl AuditBatcher {
    pub fn new(max_batch_size: usize, flush_interval: Duration, flush_fn: FlushFn) -> Self {
        let inner = Arc::new(Inner { max_batch_size: max_batch_size.max(1), buffer: Mutex::new(Vec::new()), flush_fn });
        let ticker_stop = Arc::new(Notify::new());
        let ticker_handle = spawn_ticker(inner.clone(), flush_interval, ticker_stop.clone());
        Self { inner, ticker_stop, ticker_handle: Mutex::new(Some(ticker_handle)) }
    }

    /// Appends `event`; if the buffer just reached `max_batch_size`, flushes immediately.
    pub async fn add(&self, event: AuditEvent) {
        let should_flush = {
            let mut buffer = self.inner.buffer.lock();
            buffer.push(event);
            buffer.len() >= self.inner.max_batch_size
        };
        if should_flush {
            self.inner.flush_if_nonempty().await;
        }
    }

    /// Stops the ticker and flushes whatever remains before returning.
    pub async fn stop(&self) {
        self.ticker_stop.notify_waiters();
        if let Some(handle) = self.ticker_handle.lock().take() {
            let _ = handle.await;
        }
        self.inner.flush_if_nonempty().await;
    }
}

fn spawn_ticker(inner: Arc<Inner>, flush_interval: Duration, stop: Arc<Notify>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(flush_interval);
        interval.tick().await; // the first tick fires immediately; it isn't a real period
        loop {
            tokio::select! {
                _ = interval.tick() => inner.flush_if_nonempty().await,
                _ = stop.notified() => break,
            }
        }
    })
}

/// Adapts [`AuditBatcher`] to the synchronous [`flowjs_core::AuditSink`]
/// the Executor holds, so audit emission never blocks a node's completion
/// on the batch flush (spec §9 "audit as best-effort stream").
///
/// `emit` only pushes onto an unbounded channel; a single consumer task,
/// spawned once in [`BatcherSink::new`], drains it into `batcher.add` in
/// receive order. That keeps events from the same execution landing in
/// the buffer in the order they were emitted, which spawning an
/// independent task per event can't guarantee.
pub struct BatcherSink {
    tx: mpsc::UnboundedSender<AuditEvent>,
    // Kept only so the worker task shows up under the sink's own lifetime
    // in task dumps; the process exit that follows `AuditBatcher::stop`
    // reclaims it regardless.
    _worker: JoinHandle<()>,
}

impl BatcherSink {
    pub fn new(batcher: Arc<AuditBatcher>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEvent>();
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                batcher.add(event).await;
            }
        });
        Self { tx, _worker: worker }
    }
}

impl flowjs_core::AuditSink for BatcherSink {
    fn emit(&self, event: AuditEvent) {
        // An unbounded send never blocks and preserves FIFO order across
        // calls from the same task, so event order in equals event order out.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
#[path = "batcher_tests.rs"]
mod tests;
