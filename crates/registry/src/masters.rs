// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named master endpoints.
//!
//! Invariants: at most one default row; the first record ever inserted is
//! promoted to default; the default cannot be deleted while other rows
//! remain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sloth_core::{Clock, MasterRecord};
use sloth_storage::{Store, StoreError, StoreState};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the master store
#[derive(Debug, Error)]
pub enum MasterError {
    #[error("master '{0}' not found")]
    NotFound(String),
    #[error("master '{0}' already exists")]
    AlreadyExists(String),
    #[error("cannot delete default master '{0}' while other masters exist")]
    DefaultProtected(String),
    #[error("{what} must not be empty")]
    Empty { what: &'static str },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Materialized master records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MastersState {
    pub masters: HashMap<String, MasterRecord>,
}

/// WAL operations for master records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MasterOp {
    Put { record: MasterRecord },
    Remove { name: String },
    /// Make `name` the sole default
    SetDefault { name: String, at: DateTime<Utc> },
}

impl StoreState for MastersState {
    type Op = MasterOp;

    fn apply(&mut self, op: &MasterOp) {
        match op {
            MasterOp::Put { record } => {
                self.masters.insert(record.name.clone(), record.clone());
            }
            MasterOp::Remove { name } => {
                self.masters.remove(name);
            }
            MasterOp::SetDefault { name, at } => {
                for record in self.masters.values_mut() {
                    let make_default = record.name == *name;
                    if record.is_default != make_default {
                        record.is_default = make_default;
                        record.updated_at = *at;
                    }
                }
            }
        }
    }
}

/// Durable store of master endpoints.
pub struct MasterStore<C: Clock> {
    store: Arc<Store<MastersState>>,
    clock: C,
}

impl<C: Clock> Clone for MasterStore<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock> MasterStore<C> {
    /// Open (or create) the `masters` store under `dir`.
    pub fn open(dir: &Path, clock: C) -> Result<Self, MasterError> {
        Ok(Self {
            store: Arc::new(Store::open(dir, "masters")?),
            clock,
        })
    }

    /// Add a master. The first record inserted becomes the default.
    pub fn add(
        &self,
        name: &str,
        address: &str,
        description: &str,
    ) -> Result<MasterRecord, MasterError> {
        if name.is_empty() {
            return Err(MasterError::Empty { what: "master name" });
        }
        if address.is_empty() {
            return Err(MasterError::Empty {
                what: "master address",
            });
        }
        if self.store.read(|s| s.masters.contains_key(name)) {
            return Err(MasterError::AlreadyExists(name.to_string()));
        }

        let mut record = MasterRecord::new(name, address, self.clock.now());
        record.description = description.to_string();
        record.is_default = self.store.read(|s| s.masters.is_empty());

        self.store.commit(MasterOp::Put {
            record: record.clone(),
        })?;
        Ok(record)
    }

    /// All masters sorted by name.
    pub fn list(&self) -> Vec<MasterRecord> {
        let mut masters: Vec<MasterRecord> =
            self.store.read(|s| s.masters.values().cloned().collect());
        masters.sort_by(|a, b| a.name.cmp(&b.name));
        masters
    }

    pub fn get(&self, name: &str) -> Result<MasterRecord, MasterError> {
        self.store
            .read(|s| s.masters.get(name).cloned())
            .ok_or_else(|| MasterError::NotFound(name.to_string()))
    }

    /// The current default, if any.
    pub fn default_master(&self) -> Option<MasterRecord> {
        self.store
            .read(|s| s.masters.values().find(|m| m.is_default).cloned())
    }

    /// Remove a master. Deleting the default is forbidden unless it is the
    /// last row.
    pub fn remove(&self, name: &str) -> Result<(), MasterError> {
        let (is_default, count) = self
            .store
            .read(|s| {
                s.masters
                    .get(name)
                    .map(|m| (m.is_default, s.masters.len()))
            })
            .ok_or_else(|| MasterError::NotFound(name.to_string()))?;

        if is_default && count > 1 {
            return Err(MasterError::DefaultProtected(name.to_string()));
        }

        self.store.commit(MasterOp::Remove {
            name: name.to_string(),
        })?;
        Ok(())
    }

    /// Promote `name` to the sole default.
    pub fn set_default(&self, name: &str) -> Result<(), MasterError> {
        if !self.store.read(|s| s.masters.contains_key(name)) {
            return Err(MasterError::NotFound(name.to_string()));
        }
        self.store.commit(MasterOp::SetDefault {
            name: name.to_string(),
            at: self.clock.now(),
        })?;
        Ok(())
    }

    /// Write a snapshot and truncate the WAL (shutdown hygiene).
    pub fn checkpoint(&self) -> Result<(), MasterError> {
        self.store.checkpoint()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "masters_tests.rs"]
mod tests;
