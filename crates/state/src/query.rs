// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Search, prune, analytics, and tags.

use crate::engine::{StateEngine, StateError};
use crate::model::StateOp;
use sloth_core::{
    Clock, SearchQuery, StateAnalytics, WorkflowExecutions, WorkflowState, WorkflowStatus,
};
use std::collections::HashMap;
use std::time::Duration;

/// Rows in the analytics top-workflows table.
const TOP_WORKFLOWS: usize = 5;

impl<C: Clock> StateEngine<C> {
    /// Search workflows. Present predicates are AND-ed; results are ordered
    /// by `started_at DESC` and capped at `query.limit` (0 = unlimited).
    pub fn search(&self, query: &SearchQuery) -> Vec<WorkflowState> {
        let mut matches: Vec<WorkflowState> = self.store.read(|s| {
            s.workflows
                .values()
                .filter(|w| {
                    query
                        .name
                        .as_deref()
                        .is_none_or(|name| w.name.contains(name))
                })
                .filter(|w| {
                    query.resource_type.as_deref().is_none_or(|resource_type| {
                        w.resources.iter().any(|r| r.resource_type == resource_type)
                    })
                })
                .filter(|w| {
                    query
                        .has_errors
                        .is_none_or(|has_errors| w.error_msg.is_empty() != has_errors)
                })
                .cloned()
                .collect()
        });
        matches.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if query.limit > 0 {
            matches.truncate(query.limit);
        }
        matches
    }

    /// Delete workflows whose `started_at` is older than the cutoff.
    ///
    /// With `keep_successful`, rows with `status = success` are retained.
    /// Locked workflows are never pruned. Returns the number removed.
    pub fn prune(
        &self,
        older_than: Duration,
        keep_successful: bool,
    ) -> Result<usize, StateError> {
        let cutoff = self.now()
            - chrono::Duration::from_std(older_than)
                .unwrap_or_else(|_| chrono::Duration::seconds(i64::MAX / 1_000));

        let doomed: Vec<String> = self.store.read(|s| {
            s.workflows
                .values()
                .filter(|w| w.started_at < cutoff)
                .filter(|w| !(keep_successful && w.status == WorkflowStatus::Success))
                .filter(|w| w.locked_by.is_empty())
                .map(|w| w.id.clone())
                .collect()
        });

        let removed = doomed.len();
        self.store.commit_all(
            doomed
                .into_iter()
                .map(|workflow_id| StateOp::DeleteWorkflow { workflow_id })
                .collect(),
        )?;
        if removed > 0 {
            tracing::info!(removed, keep_successful, "pruned workflows");
        }
        Ok(removed)
    }

    /// Read-only aggregation over all workflows.
    ///
    /// The success rate is `success / terminal` (0 when nothing has
    /// finished); average duration covers completed runs only.
    pub fn analytics(&self) -> StateAnalytics {
        self.store.read(|s| {
            let total_workflows = s.workflows.len();

            let mut status_distribution: HashMap<String, usize> = HashMap::new();
            let mut resource_type_distribution: HashMap<String, usize> = HashMap::new();
            let mut executions: HashMap<String, usize> = HashMap::new();
            let mut completed = 0usize;
            let mut duration_total = 0i64;

            for workflow in s.workflows.values() {
                *status_distribution
                    .entry(workflow.status.to_string())
                    .or_default() += 1;
                *executions.entry(workflow.name.clone()).or_default() += 1;
                for resource in &workflow.resources {
                    *resource_type_distribution
                        .entry(resource.resource_type.clone())
                        .or_default() += 1;
                }
                if workflow.completed_at.is_some() {
                    completed += 1;
                    duration_total += workflow.duration_secs;
                }
            }

            let terminal: usize = s
                .workflows
                .values()
                .filter(|w| w.status.is_terminal())
                .count();
            let successes = status_distribution
                .get(WorkflowStatus::Success.as_str())
                .copied()
                .unwrap_or(0);
            let success_rate = if terminal > 0 {
                successes as f64 / terminal as f64
            } else {
                0.0
            };
            let average_duration_secs = if completed > 0 {
                duration_total as f64 / completed as f64
            } else {
                0.0
            };

            let mut top_workflows: Vec<WorkflowExecutions> = executions
                .into_iter()
                .map(|(name, executions)| WorkflowExecutions { name, executions })
                .collect();
            top_workflows.sort_by(|a, b| b.executions.cmp(&a.executions).then(a.name.cmp(&b.name)));
            top_workflows.truncate(TOP_WORKFLOWS);

            StateAnalytics {
                total_workflows,
                success_rate,
                average_duration_secs,
                status_distribution,
                resource_type_distribution,
                top_workflows,
            }
        })
    }

    /// Attach a tag. Idempotent: adding an existing tag is a no-op.
    pub fn add_tag(&self, workflow_id: &str, tag: &str) -> Result<(), StateError> {
        if tag.is_empty() {
            return Err(StateError::Empty { what: "tag" });
        }
        self.require_workflow(workflow_id)?;
        self.store.commit(StateOp::AddTag {
            workflow_id: workflow_id.to_string(),
            tag: tag.to_string(),
        })?;
        Ok(())
    }

    /// Remove a tag; silently succeeds when absent.
    pub fn remove_tag(&self, workflow_id: &str, tag: &str) -> Result<(), StateError> {
        self.require_workflow(workflow_id)?;
        self.store.commit(StateOp::RemoveTag {
            workflow_id: workflow_id.to_string(),
            tag: tag.to_string(),
        })?;
        Ok(())
    }

    /// All tags of a workflow, in insertion order.
    pub fn tags(&self, workflow_id: &str) -> Result<Vec<String>, StateError> {
        self.require_workflow(workflow_id)?;
        Ok(self
            .store
            .read(|s| s.tags.get(workflow_id).cloned())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
