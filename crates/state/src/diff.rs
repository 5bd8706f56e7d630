// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural diff between two version snapshots of one workflow.
//!
//! Resources are matched across versions by `(type, name)`; ids are
//! regenerated on re-creation and would produce spurious differences.

use crate::engine::{StateEngine, StateError};
use sloth_core::{Clock, Resource, ResourceModification, ResourceRef, StateDiff, WorkflowState};
use std::collections::BTreeMap;

impl<C: Clock> StateEngine<C> {
    /// Diff the workflow between `from_version` (current) and `to_version`
    /// (desired).
    pub fn diff(
        &self,
        workflow_id: &str,
        from_version: u32,
        to_version: u32,
    ) -> Result<StateDiff, StateError> {
        let current: WorkflowState =
            serde_json::from_value(self.version(workflow_id, from_version)?.state)?;
        let desired: WorkflowState =
            serde_json::from_value(self.version(workflow_id, to_version)?.state)?;

        let current_keys = by_key(&current.resources);
        let desired_keys = by_key(&desired.resources);

        let mut added_resources = Vec::new();
        let mut modified_resources = Vec::new();
        for (key, desired_resource) in &desired_keys {
            match current_keys.get(key) {
                None => added_resources.push(resource_ref(key)),
                Some(current_resource)
                    if current_resource.attributes != desired_resource.attributes =>
                {
                    modified_resources.push(ResourceModification {
                        resource_type: key.0.clone(),
                        name: key.1.clone(),
                        before: current_resource.attributes.clone(),
                        after: desired_resource.attributes.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        let removed_resources = current_keys
            .keys()
            .filter(|key| !desired_keys.contains_key(*key))
            .map(resource_ref)
            .collect();

        let status_change = if current.status != desired.status {
            format!("{} -> {}", current.status, desired.status)
        } else {
            String::new()
        };

        Ok(StateDiff {
            workflow_id: workflow_id.to_string(),
            from_version,
            to_version,
            added_resources,
            removed_resources,
            modified_resources,
            status_change,
        })
    }
}

/// Index resources by diff identity. BTreeMap keeps diff output ordering
/// deterministic.
fn by_key(resources: &[Resource]) -> BTreeMap<(String, String), &Resource> {
    resources.iter().map(|r| (r.key(), r)).collect()
}

fn resource_ref(key: &(String, String)) -> ResourceRef {
    ResourceRef {
        resource_type: key.0.clone(),
        name: key.1.clone(),
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
