// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent registry: registration, heartbeats, liveness, metrics.
//!
//! Status is derived, never trusted from storage: an agent is Active iff
//! its last heartbeat is strictly younger than 60 seconds at read time.

use crate::state::{RegistryOp, RegistryState};
use chrono::Duration;
use sloth_core::{AgentRecord, Clock, MetricsSample};
use sloth_storage::{Store, StoreError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the agent registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    #[error("active agent not found: {0}")]
    ActiveAgentNotFound(String),
    #[error("{what} must not be empty")]
    Empty { what: &'static str },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Durable agent directory.
pub struct AgentRegistry<C: Clock> {
    store: Arc<Store<RegistryState>>,
    clock: C,
}

impl<C: Clock> Clone for AgentRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock> AgentRegistry<C> {
    /// Open (or create) the `agents` store under `dir`.
    pub fn open(dir: &Path, clock: C) -> Result<Self, RegistryError> {
        Ok(Self {
            store: Arc::new(Store::open(dir, "agents")?),
            clock,
        })
    }

    /// Register (or re-register) an agent.
    ///
    /// Upsert: a known name keeps its original `registered_at`; the address
    /// is replaced and the heartbeat reset to now.
    pub fn register(&self, name: &str, address: &str) -> Result<AgentRecord, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::Empty { what: "agent name" });
        }
        if address.is_empty() {
            return Err(RegistryError::Empty {
                what: "agent address",
            });
        }

        let now = self.clock.now();
        let mut record = AgentRecord::new(name, address, now);
        if let Some(existing) = self.store.read(|s| s.agents.get(name).cloned()) {
            record.registered_at = existing.registered_at;
            record.system_info = existing.system_info;
            record.last_info_collected = existing.last_info_collected;
            record.version = existing.version;
        }

        self.store.commit(RegistryOp::Put {
            record: record.clone(),
        })?;
        tracing::info!(agent = name, address, "agent registered");
        Ok(record)
    }

    /// Bump the heartbeat. Errors on an unknown agent.
    pub fn heartbeat(&self, name: &str) -> Result<(), RegistryError> {
        self.require(name)?;
        self.store.commit(RegistryOp::Heartbeat {
            name: name.to_string(),
            at: self.clock.now(),
        })?;
        Ok(())
    }

    /// Replace the opaque system-info blob. Errors on an unknown agent.
    pub fn update_system_info(
        &self,
        name: &str,
        info: serde_json::Value,
    ) -> Result<(), RegistryError> {
        self.require(name)?;
        self.store.commit(RegistryOp::SetSystemInfo {
            name: name.to_string(),
            info,
            at: self.clock.now(),
        })?;
        Ok(())
    }

    /// Record the agent's reported version. Errors on an unknown agent.
    pub fn update_version(&self, name: &str, version: &str) -> Result<(), RegistryError> {
        self.require(name)?;
        self.store.commit(RegistryOp::SetVersion {
            name: name.to_string(),
            version: version.to_string(),
            at: self.clock.now(),
        })?;
        Ok(())
    }

    /// Fetch one agent with its derived status.
    pub fn get(&self, name: &str) -> Result<AgentRecord, RegistryError> {
        let now = self.clock.now();
        self.store
            .read(|s| s.agents.get(name).cloned())
            .map(|mut record| {
                record.status = record.derived_status(now);
                record
            })
            .ok_or_else(|| RegistryError::AgentNotFound(name.to_string()))
    }

    /// All agents sorted by name, statuses derived at read time.
    pub fn list(&self) -> Vec<AgentRecord> {
        let now = self.clock.now();
        let mut agents: Vec<AgentRecord> = self.store.read(|s| s.agents.values().cloned().collect());
        for record in &mut agents {
            record.status = record.derived_status(now);
        }
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        agents
    }

    /// Resolve an agent's address, only while it is live per the 60 s rule.
    pub fn agent_address(&self, name: &str) -> Result<String, RegistryError> {
        let now = self.clock.now();
        self.store
            .read(|s| s.agents.get(name).cloned())
            .filter(|record| record.is_active(now))
            .map(|record| record.address)
            .ok_or_else(|| RegistryError::ActiveAgentNotFound(name.to_string()))
    }

    /// Remove an agent and its metrics history.
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        self.require(name)?;
        self.store.commit(RegistryOp::Remove {
            name: name.to_string(),
        })?;
        Ok(())
    }

    /// Alias for [`remove`](Self::remove).
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        self.remove(name)
    }

    /// Purge agents whose heartbeat is older than `max_hours`.
    /// Returns the number removed.
    pub fn cleanup_inactive(&self, max_hours: u64) -> Result<usize, RegistryError> {
        let cutoff = self.clock.now() - Duration::seconds(max_hours as i64 * 3600);
        let doomed: Vec<String> = self.store.read(|s| {
            s.agents
                .values()
                .filter(|record| record.last_heartbeat < cutoff)
                .map(|record| record.name.clone())
                .collect()
        });

        let removed = doomed.len();
        self.store.commit_all(
            doomed
                .into_iter()
                .map(|name| RegistryOp::Remove { name })
                .collect(),
        )?;
        if removed > 0 {
            tracing::info!(removed, max_hours, "purged inactive agents");
        }
        Ok(removed)
    }

    /// Append one metrics observation. Errors on an unknown agent.
    #[allow(clippy::too_many_arguments)]
    pub fn save_metrics(
        &self,
        name: &str,
        cpu_percent: f64,
        memory_percent: f64,
        disk_percent: f64,
        load_1: f64,
        load_5: f64,
        load_15: f64,
    ) -> Result<(), RegistryError> {
        self.require(name)?;
        self.store.commit(RegistryOp::AppendMetrics {
            name: name.to_string(),
            sample: MetricsSample {
                timestamp: self.clock.now(),
                cpu_percent,
                memory_percent,
                disk_percent,
                load_1,
                load_5,
                load_15,
            },
        })?;
        Ok(())
    }

    /// Metrics history newest-first, capped at `limit` (0 = unlimited).
    pub fn metrics_history(&self, name: &str, limit: usize) -> Vec<MetricsSample> {
        let mut samples: Vec<MetricsSample> = self
            .store
            .read(|s| s.metrics.get(name).map(|ring| ring.iter().cloned().collect()))
            .unwrap_or_default();
        samples.reverse();
        if limit > 0 {
            samples.truncate(limit);
        }
        samples
    }

    /// Drop metrics samples older than `days`. Returns the number removed.
    pub fn cleanup_old_metrics(&self, days: u64) -> Result<usize, RegistryError> {
        let cutoff = self.clock.now() - Duration::seconds(days as i64 * 86_400);
        let before: usize = self.store.read(|s| s.metrics.values().map(|r| r.len()).sum());
        self.store.commit(RegistryOp::PruneMetrics { cutoff })?;
        let after: usize = self.store.read(|s| s.metrics.values().map(|r| r.len()).sum());
        Ok(before.saturating_sub(after))
    }

    /// Write a snapshot and truncate the WAL (shutdown hygiene).
    pub fn checkpoint(&self) -> Result<(), RegistryError> {
        self.store.checkpoint()?;
        Ok(())
    }

    fn require(&self, name: &str) -> Result<(), RegistryError> {
        if self.store.read(|s| s.agents.contains_key(name)) {
            Ok(())
        } else {
            Err(RegistryError::AgentNotFound(name.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
