// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow state model: workflows, resources, immutable version snapshots,
//! drift detections, and the derived diff/search/analytics shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a workflow run.
///
/// `pending → running → {success, failed}`; an explicit rollback moves a
/// terminal workflow to `rolled_back`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Success,
    Failed,
    RolledBack,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Success => "success",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Success | WorkflowStatus::Failed | WorkflowStatus::RolledBack
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WorkflowStatus::Pending),
            "running" => Ok(WorkflowStatus::Running),
            "success" => Ok(WorkflowStatus::Success),
            "failed" => Ok(WorkflowStatus::Failed),
            "rolled_back" => Ok(WorkflowStatus::RolledBack),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error for an unrecognized workflow status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown workflow status: {0}")]
pub struct UnknownStatus(pub String);

/// Planned or applied action for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Create,
    Update,
    Delete,
    Read,
    Noop,
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceAction::Create => "create",
            ResourceAction::Update => "update",
            ResourceAction::Delete => "delete",
            ResourceAction::Read => "read",
            ResourceAction::Noop => "noop",
        };
        write!(f, "{s}")
    }
}

/// An opaque item managed by a workflow. Attributes are uninterpreted JSON;
/// the engine only ever compares them structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub workflow_id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub action: ResourceAction,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Identity for diff purposes: resources match across versions by
    /// `(type, name)`, not by id.
    pub fn key(&self) -> (String, String) {
        (self.resource_type.clone(), self.name.clone())
    }
}

/// Versioned state of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    /// Increments on every persisting mutation, never decreases
    pub version: u32,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_secs: i64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_msg: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locked_by: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub outputs: HashMap<String, String>,
}

impl WorkflowState {
    /// Build a fresh `pending` run at version 1.
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: 1,
            status: WorkflowStatus::Pending,
            started_at: now,
            completed_at: None,
            duration_secs: 0,
            metadata: HashMap::new(),
            error_msg: String::new(),
            locked_by: String::new(),
            resources: Vec::new(),
            outputs: HashMap::new(),
        }
    }

    /// Mark the run finished, deriving `duration_secs` from `started_at`.
    pub fn complete(&mut self, status: WorkflowStatus, at: DateTime<Utc>) {
        self.status = status;
        self.completed_at = Some(at);
        self.duration_secs = (at - self.started_at).num_seconds();
    }

    pub fn resource(&self, resource_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == resource_id)
    }
}

/// Immutable snapshot of a workflow at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVersion {
    /// `"<workflow_id>-v<N>"`
    pub id: String,
    pub workflow_id: String,
    pub version: u32,
    /// Marshaled full [`WorkflowState`]
    pub state: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl StateVersion {
    pub fn id_for(workflow_id: &str, version: u32) -> String {
        format!("{workflow_id}-v{version}")
    }
}

/// Record of an expected-vs-actual comparison for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftDetection {
    pub id: String,
    pub workflow_id: String,
    pub resource_id: String,
    pub resource_type: String,
    pub detected_at: DateTime<Utc>,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
    pub drifted: bool,
}

/// Envelope produced by export and consumed by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStateExport {
    pub state: WorkflowState,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
}

/// A resource referenced by its diff identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
}

/// A resource present in both versions whose attributes differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceModification {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// Structural difference between two version snapshots of one workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    pub workflow_id: String,
    pub from_version: u32,
    pub to_version: u32,
    #[serde(default)]
    pub added_resources: Vec<ResourceRef>,
    #[serde(default)]
    pub removed_resources: Vec<ResourceRef>,
    #[serde(default)]
    pub modified_resources: Vec<ResourceModification>,
    /// `"<from> -> <to>"` when the statuses differ, else empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status_change: String,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.added_resources.is_empty()
            && self.removed_resources.is_empty()
            && self.modified_resources.is_empty()
            && self.status_change.is_empty()
    }
}

/// Filter for workflow search. Present predicates are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_errors: Option<bool>,
    #[serde(default)]
    pub limit: usize,
}

/// One row of the top-workflows table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowExecutions {
    pub name: String,
    pub executions: usize,
}

/// Read-only aggregation over all workflows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateAnalytics {
    pub total_workflows: usize,
    /// Fraction of terminal runs that succeeded, in [0, 1]
    pub success_rate: f64,
    pub average_duration_secs: f64,
    pub status_distribution: HashMap<String, usize>,
    pub resource_type_distribution: HashMap<String, usize>,
    pub top_workflows: Vec<WorkflowExecutions>,
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
