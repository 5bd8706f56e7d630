// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized engine state and its WAL operations.
//!
//! All appliers are idempotent: replaying an op against a state that already
//! reflects it produces the same state. Deleting a workflow cascades to its
//! versions, drift detections, and tags; no other table may outlive the row.

use serde::{Deserialize, Serialize};
use sloth_core::{DriftDetection, Resource, StateVersion, WorkflowState};
use sloth_storage::StoreState;
use std::collections::HashMap;

/// Materialized state of the workflow engine, keyed by workflow id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineState {
    pub workflows: HashMap<String, WorkflowState>,
    /// Append-only version snapshots per workflow, ascending by version
    #[serde(default)]
    pub versions: HashMap<String, Vec<StateVersion>>,
    /// Drift detections per workflow, in detection order
    #[serde(default)]
    pub drifts: HashMap<String, Vec<DriftDetection>>,
    /// Free-text tags per workflow, unique within a workflow
    #[serde(default)]
    pub tags: HashMap<String, Vec<String>>,
}

impl EngineState {
    pub fn workflow(&self, id: &str) -> Option<&WorkflowState> {
        self.workflows.get(id)
    }

    /// Latest snapshot row for `(workflow, version)`.
    pub fn version(&self, workflow_id: &str, version: u32) -> Option<&StateVersion> {
        self.versions
            .get(workflow_id)?
            .iter()
            .find(|v| v.version == version)
    }
}

/// WAL operations for the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StateOp {
    /// Insert or replace the current row of a workflow
    Put { state: WorkflowState },
    /// Record an immutable version snapshot
    RecordVersion { version: StateVersion },
    /// Delete a workflow and cascade all dependent rows
    DeleteWorkflow { workflow_id: String },
    AddResource {
        workflow_id: String,
        resource: Resource,
    },
    /// Replace a resource by id
    UpdateResource {
        workflow_id: String,
        resource: Resource,
    },
    SetOutput {
        workflow_id: String,
        key: String,
        value: String,
    },
    /// Set (or clear, with an empty holder) the row-level lock
    SetLocked {
        workflow_id: String,
        locked_by: String,
    },
    RecordDrift { drift: DriftDetection },
    AddTag { workflow_id: String, tag: String },
    RemoveTag { workflow_id: String, tag: String },
}

impl StoreState for EngineState {
    type Op = StateOp;

    fn apply(&mut self, op: &StateOp) {
        match op {
            StateOp::Put { state } => {
                self.workflows.insert(state.id.clone(), state.clone());
            }
            StateOp::RecordVersion { version } => {
                let versions = self.versions.entry(version.workflow_id.clone()).or_default();
                // Snapshots are immutable: a replayed RecordVersion for an
                // existing version number must not produce a duplicate row.
                if versions.iter().all(|v| v.version != version.version) {
                    versions.push(version.clone());
                    versions.sort_by_key(|v| v.version);
                }
            }
            StateOp::DeleteWorkflow { workflow_id } => {
                self.workflows.remove(workflow_id);
                self.versions.remove(workflow_id);
                self.drifts.remove(workflow_id);
                self.tags.remove(workflow_id);
            }
            StateOp::AddResource {
                workflow_id,
                resource,
            } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                    if workflow.resources.iter().all(|r| r.id != resource.id) {
                        workflow.resources.push(resource.clone());
                    }
                }
            }
            StateOp::UpdateResource {
                workflow_id,
                resource,
            } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                    if let Some(existing) =
                        workflow.resources.iter_mut().find(|r| r.id == resource.id)
                    {
                        *existing = resource.clone();
                    }
                }
            }
            StateOp::SetOutput {
                workflow_id,
                key,
                value,
            } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                    workflow.outputs.insert(key.clone(), value.clone());
                }
            }
            StateOp::SetLocked {
                workflow_id,
                locked_by,
            } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                    workflow.locked_by = locked_by.clone();
                }
            }
            StateOp::RecordDrift { drift } => {
                if !self.workflows.contains_key(&drift.workflow_id) {
                    return;
                }
                let drifts = self.drifts.entry(drift.workflow_id.clone()).or_default();
                if drifts.iter().all(|d| d.id != drift.id) {
                    drifts.push(drift.clone());
                }
            }
            StateOp::AddTag { workflow_id, tag } => {
                if !self.workflows.contains_key(workflow_id) {
                    return;
                }
                let tags = self.tags.entry(workflow_id.clone()).or_default();
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
            StateOp::RemoveTag { workflow_id, tag } => {
                if let Some(tags) = self.tags.get_mut(workflow_id) {
                    tags.retain(|t| t != tag);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
