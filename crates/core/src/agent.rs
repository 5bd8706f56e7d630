// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent directory records and metrics samples

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An agent is reported Active iff its last heartbeat is strictly younger
/// than this window. The persisted status field is never authoritative.
pub const LIVENESS_WINDOW_SECS: i64 = 60;

/// Liveness classification, derived from `last_heartbeat` on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Durable record of a registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub name: String,
    /// host:port the agent's task listener is reachable at
    pub address: String,
    pub status: AgentStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_info_collected: Option<DateTime<Utc>>,
    /// Opaque system-info blob reported by the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl AgentRecord {
    /// Build a freshly registered record.
    pub fn new(name: impl Into<String>, address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            status: AgentStatus::Active,
            last_heartbeat: now,
            registered_at: now,
            updated_at: now,
            last_info_collected: None,
            system_info: None,
            version: String::new(),
        }
    }

    /// Strict less-than test: a heartbeat exactly 60 s old is already stale.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now - self.last_heartbeat < Duration::seconds(LIVENESS_WINDOW_SECS)
    }

    /// Recompute the derived status field for a read.
    pub fn derived_status(&self, now: DateTime<Utc>) -> AgentStatus {
        if self.is_active(now) {
            AgentStatus::Active
        } else {
            AgentStatus::Inactive
        }
    }
}

/// One appended metrics observation for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
