// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher manager: one checker task per watcher.
//!
//! Each checker owns its runtime state and fires at the watcher's cadence;
//! missed ticks are skipped, never queued, so at most one tick is pending
//! per watcher. `stop()` cancels the shared token and joins every checker.

use crate::check::{self, CustomCheck, WatcherState};
use crate::store::{WatcherStore, WatcherStoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use sloth_core::{WatcherConfig, WatcherId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Destination for watcher emissions (the agent's event worker in
/// production, a recording sink in tests).
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event_type: &str, stack: &str, run_id: &str, data: serde_json::Value);
}

/// Hosts the checker tasks for every registered watcher.
pub struct WatcherManager {
    store: WatcherStore,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
    customs: Mutex<HashMap<String, Arc<dyn CustomCheck>>>,
}

impl WatcherManager {
    pub fn new(store: WatcherStore, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            sink,
            token: CancellationToken::new(),
            tasks: Mutex::new(HashMap::new()),
            customs: Mutex::new(HashMap::new()),
        }
    }

    /// Load every persisted config and start its checker.
    pub fn start(&self) {
        let configs = self.store.list();
        info!(count = configs.len(), "starting persisted watchers");
        for config in configs {
            self.spawn_checker(config);
        }
    }

    /// Persist a config and start checking it immediately.
    pub fn register(&self, config: WatcherConfig) -> Result<WatcherId, WatcherStoreError> {
        let id = self.store.register(config.clone())?;
        self.spawn_checker(config);
        Ok(id)
    }

    /// Register a `custom` watcher with its live predicate.
    pub fn register_custom(
        &self,
        config: WatcherConfig,
        custom: Arc<dyn CustomCheck>,
    ) -> Result<WatcherId, WatcherStoreError> {
        self.customs.lock().insert(config.id.to_string(), custom);
        self.register(config)
    }

    /// Stop and forget a watcher.
    pub fn unregister(&self, id: &str) -> Result<(), WatcherStoreError> {
        self.store.unregister(id)?;
        self.customs.lock().remove(id);
        if let Some(handle) = self.tasks.lock().remove(id) {
            handle.abort();
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<WatcherConfig> {
        self.store.list()
    }

    pub fn store(&self) -> &WatcherStore {
        &self.store
    }

    /// Cancel every checker, wait for them to finish, and checkpoint the
    /// catalog.
    pub async fn stop(&self) {
        self.token.cancel();
        let handles: Vec<(String, JoinHandle<()>)> = self.tasks.lock().drain().collect();
        for (id, handle) in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(watcher = %id, error = %e, "checker task failed during shutdown");
                }
            }
        }
        if let Err(e) = self.store.checkpoint() {
            warn!(error = %e, "watcher store checkpoint failed during shutdown");
        }
        info!("watcher manager stopped");
    }

    fn spawn_checker(&self, config: WatcherConfig) {
        let id = config.id.to_string();
        let sink = Arc::clone(&self.sink);
        let token = self.token.child_token();
        let custom = self.customs.lock().get(&id).cloned();

        debug!(watcher = %id, watcher_type = %config.watcher_type, "spawning checker");
        let handle = tokio::spawn(checker_loop(config, sink, token, custom));

        if let Some(previous) = self.tasks.lock().insert(id, handle) {
            previous.abort();
        }
    }
}

async fn checker_loop(
    config: WatcherConfig,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
    custom: Option<Arc<dyn CustomCheck>>,
) {
    // The checker owns its runtime state: checks for different watchers can
    // never block each other.
    let mut state = WatcherState::default();
    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                match check::run_check(&config, &mut state, custom.as_deref()).await {
                    Ok(emissions) => {
                        for emission in emissions {
                            let data = with_watcher_id(emission.data, &config.id);
                            sink.emit(&emission.event_type, &config.stack, &config.run_id, data)
                                .await;
                        }
                    }
                    // A single failed check must not stop the watcher
                    Err(e) => {
                        warn!(watcher = %config.id, error = %e, "watcher check failed");
                    }
                }
            }
        }
    }
}

/// Every emitted event carries the id of the watcher that produced it.
fn with_watcher_id(data: serde_json::Value, id: &WatcherId) -> serde_json::Value {
    match data {
        serde_json::Value::Object(mut map) => {
            map.entry("watcher_id".to_string())
                .or_insert_with(|| serde_json::Value::String(id.to_string()));
            serde_json::Value::Object(map)
        }
        other => serde_json::json!({"watcher_id": id.to_string(), "value": other}),
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
