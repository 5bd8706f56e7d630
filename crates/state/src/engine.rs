// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow state engine: core CRUD, versioning, and rollback.
//!
//! Every persisting mutation of the workflow row itself (create, update,
//! rollback, import) bumps `version` and records an immutable snapshot in
//! the same WAL commit, so the two cannot diverge across a crash. Resource
//! and output mutations edit the current row without a version bump.

use crate::model::{EngineState, StateOp};
use chrono::{DateTime, Utc};
use sloth_core::{Clock, Resource, StateVersion, UuidIdGen, WorkflowState, WorkflowStatus};
use sloth_storage::{Store, StoreError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the state engine
#[derive(Debug, Error)]
pub enum StateError {
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("workflow already exists: {0}")]
    AlreadyExists(String),
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    #[error("resource already exists: {0}")]
    ResourceExists(String),
    #[error("version {version} not found for workflow {workflow_id}")]
    VersionNotFound { workflow_id: String, version: u32 },
    #[error("workflow '{workflow_id}' is locked by {holder}")]
    Locked {
        workflow_id: String,
        holder: String,
    },
    #[error("{what} must not be empty")]
    Empty { what: &'static str },
    /// Snapshot or attribute bags that fail to decode indicate corruption;
    /// the underlying error is surfaced verbatim.
    #[error("corrupt state payload: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Versioned workflow state engine over one durable store.
pub struct StateEngine<C: Clock> {
    pub(crate) store: Arc<Store<EngineState>>,
    pub(crate) clock: C,
    pub(crate) id_gen: UuidIdGen,
}

impl<C: Clock> Clone for StateEngine<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
            id_gen: self.id_gen.clone(),
        }
    }
}

impl<C: Clock> StateEngine<C> {
    /// Open (or create) the `stacks` store under `dir`.
    pub fn open(dir: &Path, clock: C) -> Result<Self, StateError> {
        Ok(Self {
            store: Arc::new(Store::open(dir, "stacks")?),
            clock,
            id_gen: UuidIdGen,
        })
    }

    /// Insert a new workflow and record its version-1 snapshot.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    pub fn create(&self, mut state: WorkflowState) -> Result<(), StateError> {
        if state.id.is_empty() {
            return Err(StateError::Empty { what: "workflow id" });
        }
        if state.name.is_empty() {
            return Err(StateError::Empty {
                what: "workflow name",
            });
        }
        if self.store.read(|s| s.workflows.contains_key(&state.id)) {
            return Err(StateError::AlreadyExists(state.id));
        }

        if state.version == 0 {
            state.version = 1;
        }
        let snapshot = self.snapshot_of(&state, "initial state")?;
        self.store.commit_all(vec![
            StateOp::Put { state },
            StateOp::RecordVersion { version: snapshot },
        ])?;
        Ok(())
    }

    /// Persist a mutation of the workflow row.
    ///
    /// The stored version is authoritative: whatever the caller passed in,
    /// the result is `current.version + 1`, with a matching snapshot row.
    /// Returns the new version number.
    pub fn update(
        &self,
        mut state: WorkflowState,
        description: impl Into<String>,
    ) -> Result<u32, StateError> {
        let current_version = self
            .store
            .read(|s| s.workflows.get(&state.id).map(|w| w.version))
            .ok_or_else(|| StateError::WorkflowNotFound(state.id.clone()))?;

        state.version = current_version + 1;
        if let Some(completed_at) = state.completed_at {
            state.duration_secs = (completed_at - state.started_at).num_seconds();
        }

        let new_version = state.version;
        let snapshot = self.snapshot_of(&state, description)?;
        self.store.commit_all(vec![
            StateOp::Put { state },
            StateOp::RecordVersion { version: snapshot },
        ])?;
        Ok(new_version)
    }

    /// Fetch a workflow with resources hydrated in `created_at` order.
    pub fn get(&self, id: &str) -> Result<WorkflowState, StateError> {
        self.store
            .read(|s| s.workflows.get(id).cloned())
            .map(hydrate)
            .ok_or_else(|| StateError::WorkflowNotFound(id.to_string()))
    }

    /// Fetch the most recent workflow carrying `name`, resolved by
    /// `(version, started_at)`.
    pub fn get_by_name(&self, name: &str) -> Result<WorkflowState, StateError> {
        self.store
            .read(|s| {
                s.workflows
                    .values()
                    .filter(|w| w.name == name)
                    .max_by_key(|w| (w.version, w.started_at))
                    .cloned()
            })
            .map(hydrate)
            .ok_or_else(|| StateError::WorkflowNotFound(name.to_string()))
    }

    /// List workflows, newest first. Present filters are AND-ed.
    pub fn list(
        &self,
        name: Option<&str>,
        status: Option<WorkflowStatus>,
    ) -> Vec<WorkflowState> {
        let mut workflows: Vec<WorkflowState> = self.store.read(|s| {
            s.workflows
                .values()
                .filter(|w| name.is_none_or(|n| w.name == n))
                .filter(|w| status.is_none_or(|st| w.status == st))
                .cloned()
                .collect()
        });
        workflows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        workflows.into_iter().map(hydrate).collect()
    }

    /// Delete a workflow and cascade resources, outputs, versions, drift
    /// detections, and tags. Deleting a locked workflow is refused.
    pub fn delete(&self, id: &str) -> Result<(), StateError> {
        let locked_by = self
            .store
            .read(|s| s.workflows.get(id).map(|w| w.locked_by.clone()))
            .ok_or_else(|| StateError::WorkflowNotFound(id.to_string()))?;
        if !locked_by.is_empty() {
            return Err(StateError::Locked {
                workflow_id: id.to_string(),
                holder: locked_by,
            });
        }
        self.store.commit(StateOp::DeleteWorkflow {
            workflow_id: id.to_string(),
        })?;
        Ok(())
    }

    /// Attach a resource to a workflow. `(workflow_id, resource.id)` is
    /// unique; timestamps are stamped here.
    pub fn add_resource(
        &self,
        workflow_id: &str,
        mut resource: Resource,
    ) -> Result<(), StateError> {
        if resource.id.is_empty() {
            return Err(StateError::Empty { what: "resource id" });
        }
        let exists = self
            .store
            .read(|s| {
                s.workflows
                    .get(workflow_id)
                    .map(|w| w.resources.iter().any(|r| r.id == resource.id))
            })
            .ok_or_else(|| StateError::WorkflowNotFound(workflow_id.to_string()))?;
        if exists {
            return Err(StateError::ResourceExists(resource.id));
        }

        let now = self.clock.now();
        resource.workflow_id = workflow_id.to_string();
        resource.created_at = now;
        resource.updated_at = now;
        self.store.commit(StateOp::AddResource {
            workflow_id: workflow_id.to_string(),
            resource,
        })?;
        Ok(())
    }

    /// Replace a resource's mutable fields, preserving `created_at`.
    pub fn update_resource(
        &self,
        workflow_id: &str,
        mut resource: Resource,
    ) -> Result<(), StateError> {
        let created_at = self
            .store
            .read(|s| {
                s.workflows.get(workflow_id).map(|w| {
                    w.resources
                        .iter()
                        .find(|r| r.id == resource.id)
                        .map(|r| r.created_at)
                })
            })
            .ok_or_else(|| StateError::WorkflowNotFound(workflow_id.to_string()))?
            .ok_or_else(|| StateError::ResourceNotFound(resource.id.clone()))?;

        resource.workflow_id = workflow_id.to_string();
        resource.created_at = created_at;
        resource.updated_at = self.clock.now();
        self.store.commit(StateOp::UpdateResource {
            workflow_id: workflow_id.to_string(),
            resource,
        })?;
        Ok(())
    }

    /// Upsert an output under its composite `(workflow, key)` identity.
    pub fn set_output(&self, workflow_id: &str, key: &str, value: &str) -> Result<(), StateError> {
        if key.is_empty() {
            return Err(StateError::Empty { what: "output key" });
        }
        self.require_workflow(workflow_id)?;
        self.store.commit(StateOp::SetOutput {
            workflow_id: workflow_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    /// All version snapshots for a workflow, ascending by version.
    pub fn versions(&self, workflow_id: &str) -> Result<Vec<StateVersion>, StateError> {
        self.require_workflow(workflow_id)?;
        Ok(self
            .store
            .read(|s| s.versions.get(workflow_id).cloned())
            .unwrap_or_default())
    }

    /// One version snapshot.
    pub fn version(&self, workflow_id: &str, version: u32) -> Result<StateVersion, StateError> {
        self.require_workflow(workflow_id)?;
        self.store
            .read(|s| s.version(workflow_id, version).cloned())
            .ok_or(StateError::VersionNotFound {
                workflow_id: workflow_id.to_string(),
                version,
            })
    }

    /// Restore the state recorded at `target_version` under a new version
    /// number and `rolled_back` status. The history chain is preserved.
    pub fn rollback(&self, workflow_id: &str, target_version: u32) -> Result<u32, StateError> {
        let snapshot = self.version(workflow_id, target_version)?;
        let mut restored: WorkflowState = serde_json::from_value(snapshot.state)?;
        restored.id = workflow_id.to_string();
        restored.status = WorkflowStatus::RolledBack;

        let new_version = self.update(
            restored,
            format!("rollback to version {target_version}"),
        )?;
        tracing::info!(
            workflow_id,
            target_version,
            new_version,
            "workflow rolled back",
        );
        Ok(new_version)
    }

    /// Set the row-level lock holder. Fails if another holder has it.
    pub fn lock_workflow(&self, workflow_id: &str, holder: &str) -> Result<(), StateError> {
        if holder.is_empty() {
            return Err(StateError::Empty { what: "holder" });
        }
        let current = self
            .store
            .read(|s| s.workflows.get(workflow_id).map(|w| w.locked_by.clone()))
            .ok_or_else(|| StateError::WorkflowNotFound(workflow_id.to_string()))?;
        if !current.is_empty() && current != holder {
            return Err(StateError::Locked {
                workflow_id: workflow_id.to_string(),
                holder: current,
            });
        }
        self.store.commit(StateOp::SetLocked {
            workflow_id: workflow_id.to_string(),
            locked_by: holder.to_string(),
        })?;
        Ok(())
    }

    /// Clear the row-level lock. Only the recorded holder may clear it.
    pub fn unlock_workflow(&self, workflow_id: &str, holder: &str) -> Result<(), StateError> {
        let current = self
            .store
            .read(|s| s.workflows.get(workflow_id).map(|w| w.locked_by.clone()))
            .ok_or_else(|| StateError::WorkflowNotFound(workflow_id.to_string()))?;
        if current != holder {
            return Err(StateError::Locked {
                workflow_id: workflow_id.to_string(),
                holder: current,
            });
        }
        self.store.commit(StateOp::SetLocked {
            workflow_id: workflow_id.to_string(),
            locked_by: String::new(),
        })?;
        Ok(())
    }

    /// Write a snapshot and truncate the WAL (shutdown hygiene).
    pub fn checkpoint(&self) -> Result<(), StateError> {
        self.store.checkpoint()?;
        Ok(())
    }

    pub(crate) fn require_workflow(&self, workflow_id: &str) -> Result<(), StateError> {
        if self.store.read(|s| s.workflows.contains_key(workflow_id)) {
            Ok(())
        } else {
            Err(StateError::WorkflowNotFound(workflow_id.to_string()))
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn snapshot_of(
        &self,
        state: &WorkflowState,
        description: impl Into<String>,
    ) -> Result<StateVersion, StateError> {
        Ok(StateVersion {
            id: StateVersion::id_for(&state.id, state.version),
            workflow_id: state.id.clone(),
            version: state.version,
            state: serde_json::to_value(state)?,
            created_at: self.clock.now(),
            created_by: "state-engine".to_string(),
            description: description.into(),
        })
    }
}

/// Return the workflow with resources sorted by `created_at`.
fn hydrate(mut workflow: WorkflowState) -> WorkflowState {
    workflow
        .resources
        .sort_by(|a, b| a.created_at.cmp(&b.created_at));
    workflow
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
