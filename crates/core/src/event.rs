// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events shipped from agents to the master.
//!
//! An event is an immutable, time-stamped observation. Once enqueued in the
//! agent's event worker it is never edited; the master deduplicates on
//! `event_id`, so redelivery after a transport failure is harmless.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id! {
    /// Globally unique event identifier (UUID v4).
    pub struct EventId;
}

/// Event severity. Closed set; strings only exist for wire compatibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            "fatal" => Ok(Severity::Fatal),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

/// Error for an unrecognized severity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

/// A structured observation sent from an agent to the master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    /// Dotted event name, e.g. `file.modified` or `cpu.high_usage`
    pub event_type: String,
    pub agent_name: String,
    /// Unix seconds, sampled at enqueue time
    pub timestamp: i64,
    /// Correlation label tying the event to a workflow stack
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack: String,
    /// Correlation label tying the event to a workflow run
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_id: String,
    /// JSON-encoded payload
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub severity: Severity,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
