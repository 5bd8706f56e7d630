// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized registry state and its WAL operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sloth_core::{AgentRecord, MetricsSample};
use sloth_storage::StoreState;
use std::collections::{HashMap, VecDeque};

/// In-memory bound on metrics samples kept per agent (one day at one sample
/// per minute). Older rows are additionally prunable by age.
pub const METRICS_HISTORY_LIMIT: usize = 1440;

/// Materialized registry: agents plus their metrics rings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryState {
    pub agents: HashMap<String, AgentRecord>,
    #[serde(default)]
    pub metrics: HashMap<String, VecDeque<MetricsSample>>,
}

/// WAL operations for the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RegistryOp {
    /// Insert or replace an agent row (registration computes the row)
    Put { record: AgentRecord },
    Heartbeat {
        name: String,
        at: DateTime<Utc>,
    },
    SetSystemInfo {
        name: String,
        info: serde_json::Value,
        at: DateTime<Utc>,
    },
    SetVersion {
        name: String,
        version: String,
        at: DateTime<Utc>,
    },
    /// Remove an agent and its metrics history
    Remove { name: String },
    AppendMetrics {
        name: String,
        sample: MetricsSample,
    },
    /// Drop metrics samples older than the cutoff, across all agents
    PruneMetrics { cutoff: DateTime<Utc> },
}

impl StoreState for RegistryState {
    type Op = RegistryOp;

    fn apply(&mut self, op: &RegistryOp) {
        match op {
            RegistryOp::Put { record } => {
                self.agents.insert(record.name.clone(), record.clone());
            }
            RegistryOp::Heartbeat { name, at } => {
                if let Some(agent) = self.agents.get_mut(name) {
                    agent.last_heartbeat = *at;
                    agent.updated_at = *at;
                }
            }
            RegistryOp::SetSystemInfo { name, info, at } => {
                if let Some(agent) = self.agents.get_mut(name) {
                    agent.system_info = Some(info.clone());
                    agent.last_info_collected = Some(*at);
                    agent.updated_at = *at;
                }
            }
            RegistryOp::SetVersion { name, version, at } => {
                if let Some(agent) = self.agents.get_mut(name) {
                    agent.version = version.clone();
                    agent.updated_at = *at;
                }
            }
            RegistryOp::Remove { name } => {
                self.agents.remove(name);
                self.metrics.remove(name);
            }
            RegistryOp::AppendMetrics { name, sample } => {
                let ring = self.metrics.entry(name.clone()).or_default();
                ring.push_back(sample.clone());
                while ring.len() > METRICS_HISTORY_LIMIT {
                    ring.pop_front();
                }
            }
            RegistryOp::PruneMetrics { cutoff } => {
                for ring in self.metrics.values_mut() {
                    ring.retain(|sample| sample.timestamp >= *cutoff);
                }
                self.metrics.retain(|_, ring| !ring.is_empty());
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
