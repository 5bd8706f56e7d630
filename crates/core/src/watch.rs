// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher configuration: the typed catalog entries persisted on each agent.
//!
//! A watcher's runtime state (last hash, last size, ...) is deliberately not
//! part of the config; it is recomputed from the first check after restart.

use crate::id::{IdGen, UuidIdGen};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

crate::define_id! {
    /// Globally unique watcher identifier (UUID v4).
    pub struct WatcherId;
}

/// Default check cadence when the config carries none.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// What an agent-local watcher samples.
///
/// `network`, `connection`, `user`, and `package` are reserved: their checks
/// are platform-dependent and currently no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherType {
    File,
    Directory,
    Process,
    Port,
    Service,
    Log,
    Command,
    Cpu,
    Memory,
    Disk,
    Network,
    Connection,
    User,
    Package,
    Custom,
}

impl WatcherType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatcherType::File => "file",
            WatcherType::Directory => "directory",
            WatcherType::Process => "process",
            WatcherType::Port => "port",
            WatcherType::Service => "service",
            WatcherType::Log => "log",
            WatcherType::Command => "command",
            WatcherType::Cpu => "cpu",
            WatcherType::Memory => "memory",
            WatcherType::Disk => "disk",
            WatcherType::Network => "network",
            WatcherType::Connection => "connection",
            WatcherType::User => "user",
            WatcherType::Package => "package",
            WatcherType::Custom => "custom",
        }
    }

    /// Reserved types have no check implementation on this platform.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            WatcherType::Network | WatcherType::Connection | WatcherType::User | WatcherType::Package
        )
    }
}

impl fmt::Display for WatcherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Condition a watcher fires on. A watcher only emits for conditions present
/// in its `conditions` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCondition {
    Changed,
    Created,
    Deleted,
    Exists,
    Above,
    Below,
    Matches,
    Contains,
    Increased,
    Decreased,
}

impl EventCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCondition::Changed => "changed",
            EventCondition::Created => "created",
            EventCondition::Deleted => "deleted",
            EventCondition::Exists => "exists",
            EventCondition::Above => "above",
            EventCondition::Below => "below",
            EventCondition::Matches => "matches",
            EventCondition::Contains => "contains",
            EventCondition::Increased => "increased",
            EventCondition::Decreased => "decreased",
        }
    }
}

impl fmt::Display for EventCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventCondition {
    type Err = WatchConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "changed" => Ok(EventCondition::Changed),
            "created" => Ok(EventCondition::Created),
            "deleted" => Ok(EventCondition::Deleted),
            "exists" => Ok(EventCondition::Exists),
            "above" => Ok(EventCondition::Above),
            "below" => Ok(EventCondition::Below),
            "matches" => Ok(EventCondition::Matches),
            "contains" => Ok(EventCondition::Contains),
            "increased" => Ok(EventCondition::Increased),
            "decreased" => Ok(EventCondition::Decreased),
            other => Err(WatchConfigError::UnknownCondition(other.to_string())),
        }
    }
}

/// Validation errors for watcher configs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchConfigError {
    #[error("watcher conditions must not be empty")]
    NoConditions,
    #[error("unknown event condition: {0}")]
    UnknownCondition(String),
    #[error("{watcher_type} watcher requires {field}")]
    MissingField {
        watcher_type: WatcherType,
        field: &'static str,
    },
}

/// Persisted configuration of one watcher.
///
/// Type-specific fields are flattened and defaulted so configs round-trip
/// through JSON without carrying irrelevant keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub id: WatcherId,
    #[serde(rename = "type")]
    pub watcher_type: WatcherType,
    pub conditions: Vec<EventCondition>,
    /// Check cadence in seconds; 0 means the 5 s default
    #[serde(default)]
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_id: String,

    // file / directory / log / disk
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_path: String,
    #[serde(default)]
    pub check_hash: bool,
    #[serde(default)]
    pub recursive: bool,

    // process
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub process_name: String,

    // port
    #[serde(default)]
    pub port: u16,

    // service
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_name: String,

    // log
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    // command
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    // cpu / memory / disk
    #[serde(default)]
    pub threshold: f64,
}

impl WatcherConfig {
    /// Build a config with a fresh UUID and the given type and conditions.
    pub fn new(watcher_type: WatcherType, conditions: Vec<EventCondition>) -> Self {
        Self {
            id: WatcherId::new(UuidIdGen.next()),
            watcher_type,
            conditions,
            interval_secs: 0,
            stack: String::new(),
            run_id: String::new(),
            file_path: String::new(),
            check_hash: false,
            recursive: false,
            process_name: String::new(),
            port: 0,
            service_name: String::new(),
            pattern: String::new(),
            command: String::new(),
            threshold: 0.0,
        }
    }

    /// Effective cadence: configured value, floored at 1 s, defaulting to 5 s.
    pub fn interval(&self) -> Duration {
        match self.interval_secs {
            0 => Duration::from_secs(DEFAULT_INTERVAL_SECS),
            s => Duration::from_secs(s.max(1)),
        }
    }

    pub fn has_condition(&self, condition: EventCondition) -> bool {
        self.conditions.contains(&condition)
    }

    /// Check the per-type required fields and the non-empty condition set.
    pub fn validate(&self) -> Result<(), WatchConfigError> {
        if self.conditions.is_empty() {
            return Err(WatchConfigError::NoConditions);
        }
        let missing = |field| WatchConfigError::MissingField {
            watcher_type: self.watcher_type,
            field,
        };
        match self.watcher_type {
            WatcherType::File | WatcherType::Directory | WatcherType::Disk => {
                if self.file_path.is_empty() {
                    return Err(missing("file_path"));
                }
            }
            WatcherType::Log => {
                if self.file_path.is_empty() {
                    return Err(missing("file_path"));
                }
                if self.pattern.is_empty() {
                    return Err(missing("pattern"));
                }
            }
            WatcherType::Process => {
                if self.process_name.is_empty() {
                    return Err(missing("process_name"));
                }
            }
            WatcherType::Port => {
                if self.port == 0 {
                    return Err(missing("port"));
                }
            }
            WatcherType::Service => {
                if self.service_name.is_empty() {
                    return Err(missing("service_name"));
                }
            }
            WatcherType::Command => {
                if self.command.is_empty() {
                    return Err(missing("command"));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
