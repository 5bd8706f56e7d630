// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable catalog of watcher configurations.

use serde::{Deserialize, Serialize};
use sloth_core::{WatchConfigError, WatcherConfig, WatcherId};
use sloth_storage::{Store, StoreError, StoreState};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the watcher store
#[derive(Debug, Error)]
pub enum WatcherStoreError {
    #[error("watcher not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Config(#[from] WatchConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Materialized watcher catalog, keyed by watcher id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatcherCatalog {
    pub watchers: HashMap<String, WatcherConfig>,
}

/// WAL operations for the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WatcherOp {
    Put { config: WatcherConfig },
    Remove { id: String },
}

impl StoreState for WatcherCatalog {
    type Op = WatcherOp;

    fn apply(&mut self, op: &WatcherOp) {
        match op {
            WatcherOp::Put { config } => {
                self.watchers.insert(config.id.to_string(), config.clone());
            }
            WatcherOp::Remove { id } => {
                self.watchers.remove(id);
            }
        }
    }
}

/// Durable watcher catalog for one agent.
pub struct WatcherStore {
    store: Arc<Store<WatcherCatalog>>,
}

impl Clone for WatcherStore {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl WatcherStore {
    /// Open the catalog at an explicit snapshot path (the WAL lives beside
    /// it). The default path comes from `sloth_core::paths::watcher_db_path`.
    pub fn open_at(db_path: &Path) -> Result<Self, WatcherStoreError> {
        let wal_path = db_path.with_extension("wal");
        Ok(Self {
            store: Arc::new(Store::open_at(db_path, &wal_path)?),
        })
    }

    /// Open the `watchers` store under `dir` (test convenience).
    pub fn open(dir: &Path) -> Result<Self, WatcherStoreError> {
        Ok(Self {
            store: Arc::new(Store::open(dir, "watchers")?),
        })
    }

    /// Validate and persist a config. Returns the watcher id.
    pub fn register(&self, config: WatcherConfig) -> Result<WatcherId, WatcherStoreError> {
        config.validate()?;
        let id = config.id.clone();
        self.store.commit(WatcherOp::Put { config })?;
        Ok(id)
    }

    /// Remove a config by id; errors when unknown.
    pub fn unregister(&self, id: &str) -> Result<(), WatcherStoreError> {
        if !self.store.read(|s| s.watchers.contains_key(id)) {
            return Err(WatcherStoreError::NotFound(id.to_string()));
        }
        self.store.commit(WatcherOp::Remove { id: id.to_string() })?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<WatcherConfig, WatcherStoreError> {
        self.store
            .read(|s| s.watchers.get(id).cloned())
            .ok_or_else(|| WatcherStoreError::NotFound(id.to_string()))
    }

    /// All configs, sorted by id for stable listings.
    pub fn list(&self) -> Vec<WatcherConfig> {
        let mut configs: Vec<WatcherConfig> =
            self.store.read(|s| s.watchers.values().cloned().collect());
        configs.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        configs
    }

    /// Write a snapshot and truncate the WAL (shutdown hygiene).
    pub fn checkpoint(&self) -> Result<(), WatcherStoreError> {
        self.store.checkpoint()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
