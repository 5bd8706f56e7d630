// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drift detection: expected-vs-actual comparison of resource attributes.
//!
//! Equality is strict structural JSON equality. Two numerically equivalent
//! but textually different values (`1` vs `1.0`) compare unequal, and key
//! order never matters.

use crate::engine::{StateEngine, StateError};
use crate::model::StateOp;
use sloth_core::{Clock, DriftDetection, IdGen};

impl<C: Clock> StateEngine<C> {
    /// Compare `expected` and `actual` for one resource and record the
    /// outcome. `drifted` is true iff the two values differ structurally.
    pub fn detect_drift(
        &self,
        workflow_id: &str,
        resource_id: &str,
        expected: serde_json::Value,
        actual: serde_json::Value,
    ) -> Result<DriftDetection, StateError> {
        let resource_type = self
            .store
            .read(|s| {
                s.workflows.get(workflow_id).map(|w| {
                    w.resources
                        .iter()
                        .find(|r| r.id == resource_id)
                        .map(|r| r.resource_type.clone())
                })
            })
            .ok_or_else(|| StateError::WorkflowNotFound(workflow_id.to_string()))?
            .ok_or_else(|| StateError::ResourceNotFound(resource_id.to_string()))?;

        let drift = DriftDetection {
            id: self.id_gen.next(),
            workflow_id: workflow_id.to_string(),
            resource_id: resource_id.to_string(),
            resource_type,
            detected_at: self.now(),
            drifted: expected != actual,
            expected,
            actual,
        };

        self.store.commit(StateOp::RecordDrift {
            drift: drift.clone(),
        })?;
        Ok(drift)
    }

    /// All drift detections for a workflow, newest first.
    pub fn drift_detections(&self, workflow_id: &str) -> Result<Vec<DriftDetection>, StateError> {
        self.require_workflow(workflow_id)?;
        let mut drifts = self
            .store
            .read(|s| s.drifts.get(workflow_id).cloned())
            .unwrap_or_default();
        drifts.reverse();
        Ok(drifts)
    }
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
