// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ring-buffered event batcher with at-least-once delivery.
//!
//! Events are buffered under a mutex and shipped as one batch RPC when the
//! buffer reaches capacity (synchronously, on the enqueuing caller's path)
//! or when the periodic ticker fires. On transport failure the snapshot is
//! prepended back into the buffer, preserving FIFO order; the master
//! deduplicates on `event_id`, so redelivery is harmless.

use async_trait::async_trait;
use parking_lot::Mutex;
use sloth_core::{Event, EventId, IdGen, Severity, UuidIdGen};
use sloth_wire::{Client, Request, Response, WireError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default batch capacity.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default periodic flush cadence.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
/// Deadline for one batch RPC.
pub const BATCH_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced by the event worker
#[derive(Debug, Error)]
pub enum EventWorkerError {
    /// Unencodable payloads fail fast; the event is never enqueued
    #[error("failed to encode event data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("event batch send failed: {0}")]
    Transport(#[from] WireError),
}

/// Master's acknowledgement of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchAck {
    pub success: bool,
    pub events_processed: u32,
    pub failed_event_ids: Vec<String>,
    pub message: String,
}

/// Transport for event batches. The wire client in production, a recording
/// fake in tests.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn send_batch(&self, events: Vec<Event>) -> Result<BatchAck, WireError>;
}

/// Production transport: `SendEventBatch` over the wire protocol.
pub struct WireTransport {
    client: Client,
    batch_size: u32,
}

impl WireTransport {
    pub fn new(master_address: impl Into<String>, batch_size: usize) -> Self {
        Self {
            client: Client::new(master_address).with_timeout(BATCH_RPC_TIMEOUT),
            batch_size: batch_size as u32,
        }
    }
}

#[async_trait]
impl EventTransport for WireTransport {
    async fn send_batch(&self, events: Vec<Event>) -> Result<BatchAck, WireError> {
        let response = self
            .client
            .call(&Request::SendEventBatch {
                events,
                batch_size: self.batch_size,
            })
            .await?;
        match response {
            Response::EventBatch {
                success,
                events_processed,
                failed_event_ids,
                message,
            } => Ok(BatchAck {
                success,
                events_processed,
                failed_event_ids,
                message,
            }),
            other => Err(WireError::Remote(format!(
                "unexpected response to event batch: {other:?}"
            ))),
        }
    }
}

struct WorkerInner<I: IdGen> {
    agent_name: String,
    batch_size: usize,
    buffer: Mutex<Vec<Event>>,
    transport: Arc<dyn EventTransport>,
    id_gen: I,
    /// Serializes flushes so re-buffering keeps FIFO order
    flush_gate: tokio::sync::Mutex<()>,
}

/// The per-agent event batcher.
#[derive(Clone)]
pub struct EventWorker<I: IdGen = UuidIdGen> {
    inner: Arc<WorkerInner<I>>,
    token: CancellationToken,
    flush_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    flush_interval: Duration,
}

impl EventWorker<UuidIdGen> {
    /// Create a worker with UUID event ids and default batching.
    pub fn new(agent_name: impl Into<String>, transport: Arc<dyn EventTransport>) -> Self {
        Self::with_config(
            agent_name,
            transport,
            DEFAULT_BATCH_SIZE,
            DEFAULT_FLUSH_INTERVAL,
        )
    }

    /// Build a worker with explicit batch capacity (a size of 1 flushes on
    /// every enqueue) and periodic flush cadence.
    pub fn with_config(
        agent_name: impl Into<String>,
        transport: Arc<dyn EventTransport>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        Self::with_id_gen(agent_name, transport, batch_size, flush_interval, UuidIdGen)
    }
}

impl<I: IdGen> EventWorker<I> {
    /// Build a worker with a custom id generator (for deterministic tests).
    pub fn with_id_gen(
        agent_name: impl Into<String>,
        transport: Arc<dyn EventTransport>,
        batch_size: usize,
        flush_interval: Duration,
        id_gen: I,
    ) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                agent_name: agent_name.into(),
                batch_size: batch_size.max(1),
                buffer: Mutex::new(Vec::new()),
                transport,
                id_gen,
                flush_gate: tokio::sync::Mutex::new(()),
            }),
            token: CancellationToken::new(),
            flush_task: Arc::new(Mutex::new(None)),
            flush_interval,
        }
    }

    /// Spawn the periodic flush task.
    pub fn start(&self) {
        let worker = self.clone();
        let token = self.token.clone();
        let interval = self.flush_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The immediate first tick would flush an empty buffer; skip it
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = worker.flush().await {
                            debug!(error = %e, "periodic event flush failed, events re-buffered");
                        }
                    }
                }
            }
        });
        *self.flush_task.lock() = Some(handle);
    }

    /// Enqueue an event with the default `info` severity.
    pub async fn send_event(
        &self,
        event_type: &str,
        stack: &str,
        run_id: &str,
        data: serde_json::Value,
    ) -> Result<(), EventWorkerError> {
        self.send_event_with_severity(event_type, stack, run_id, data, Severity::Info)
            .await
    }

    /// Enqueue an event. If the buffer reaches capacity the flush happens
    /// synchronously on this call.
    pub async fn send_event_with_severity(
        &self,
        event_type: &str,
        stack: &str,
        run_id: &str,
        data: serde_json::Value,
        severity: Severity,
    ) -> Result<(), EventWorkerError> {
        // Fail fast on unencodable payloads
        let data = serde_json::to_string(&data)?;

        let event = Event {
            event_id: EventId::new(self.inner.id_gen.next()),
            event_type: event_type.to_string(),
            agent_name: self.inner.agent_name.clone(),
            timestamp: chrono::Utc::now().timestamp(),
            stack: stack.to_string(),
            run_id: run_id.to_string(),
            data,
            severity,
        };

        let at_capacity = {
            let mut buffer = self.inner.buffer.lock();
            buffer.push(event);
            buffer.len() >= self.inner.batch_size
        };

        if at_capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Ship everything buffered as one batch RPC.
    ///
    /// On transport error the snapshot is prepended back (FIFO preserved)
    /// and the error is reported. Partial success is logged but counts as a
    /// completed flush; delivery is at-least-once and the master dedupes.
    pub async fn flush(&self) -> Result<(), EventWorkerError> {
        let _gate = self.inner.flush_gate.lock().await;

        let snapshot: Vec<Event> = {
            let mut buffer = self.inner.buffer.lock();
            std::mem::take(&mut *buffer)
        };
        if snapshot.is_empty() {
            return Ok(());
        }

        match self.inner.transport.send_batch(snapshot.clone()).await {
            Ok(ack) => {
                if !ack.failed_event_ids.is_empty()
                    || (ack.events_processed as usize) < snapshot.len()
                {
                    warn!(
                        processed = ack.events_processed,
                        failed = ack.failed_event_ids.len(),
                        message = %ack.message,
                        "event batch partially processed",
                    );
                }
                Ok(())
            }
            Err(e) => {
                let mut buffer = self.inner.buffer.lock();
                let mut restored = snapshot;
                restored.append(&mut buffer);
                *buffer = restored;
                Err(e.into())
            }
        }
    }

    /// Cancel the ticker, wait for it, then do one final flush.
    pub async fn stop(&self) {
        self.token.cancel();
        let handle = self.flush_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        if let Err(e) = self.flush().await {
            warn!(error = %e, buffered = self.buffered(), "final event flush failed");
        }
    }

    /// Number of events currently buffered.
    pub fn buffered(&self) -> usize {
        self.inner.buffer.lock().len()
    }
}

/// Watcher emissions feed straight into the batcher. Delivery failures are
/// logged, not propagated; a watcher must never stall on the master.
#[async_trait]
impl<I: IdGen> sloth_watcher::EventSink for EventWorker<I> {
    async fn emit(&self, event_type: &str, stack: &str, run_id: &str, data: serde_json::Value) {
        if let Err(e) = self.send_event(event_type, stack, run_id, data).await {
            warn!(event_type, error = %e, "failed to enqueue watcher event");
        }
    }
}

#[cfg(test)]
#[path = "event_worker_tests.rs"]
mod tests;
