// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export/import and backup/restore of workflow state.
//!
//! Export carries the hydrated workflow in a dated envelope; backup is the
//! same envelope, zstd-compressed into a deterministically named artifact.
//! Import replaces an existing workflow only under `overwrite`.

use crate::engine::{StateEngine, StateError};
use crate::model::StateOp;
use sloth_core::{Clock, StateVersion, WorkflowStateExport};
use std::path::{Path, PathBuf};

/// zstd level for backup artifacts
const BACKUP_COMPRESSION_LEVEL: i32 = 3;

impl<C: Clock> StateEngine<C> {
    /// Produce the export envelope for one workflow.
    pub fn export(
        &self,
        workflow_id: &str,
        exported_by: &str,
    ) -> Result<WorkflowStateExport, StateError> {
        Ok(WorkflowStateExport {
            state: self.get(workflow_id)?,
            exported_at: self.now(),
            exported_by: exported_by.to_string(),
        })
    }

    /// Import an export envelope.
    ///
    /// If the workflow exists: `overwrite = true` replaces it wholesale
    /// (cascading the old dependents first), `overwrite = false` fails with
    /// `AlreadyExists`. The imported version number is kept and a matching
    /// snapshot row is recorded so rollback keeps working.
    pub fn import(
        &self,
        export: WorkflowStateExport,
        overwrite: bool,
    ) -> Result<(), StateError> {
        let mut state = export.state;
        if state.id.is_empty() {
            return Err(StateError::Empty { what: "workflow id" });
        }
        if state.version == 0 {
            state.version = 1;
        }

        let exists = self.store.read(|s| s.workflows.contains_key(&state.id));
        if exists && !overwrite {
            return Err(StateError::AlreadyExists(state.id));
        }

        let snapshot = StateVersion {
            id: StateVersion::id_for(&state.id, state.version),
            workflow_id: state.id.clone(),
            version: state.version,
            state: serde_json::to_value(&state)?,
            created_at: self.now(),
            created_by: export.exported_by.clone(),
            description: format!("imported from export of {}", export.exported_at),
        };

        let mut ops = Vec::new();
        if exists {
            ops.push(StateOp::DeleteWorkflow {
                workflow_id: state.id.clone(),
            });
        }
        ops.push(StateOp::Put { state });
        ops.push(StateOp::RecordVersion { version: snapshot });
        self.store.commit_all(ops)?;
        Ok(())
    }

    /// Write a compressed export into `dir`.
    ///
    /// The artifact is named `<workflow_id>-<yyyymmddHHMMSS>.json.zst`.
    /// Returns the artifact path.
    pub fn backup(&self, workflow_id: &str, dir: &Path) -> Result<PathBuf, StateError> {
        let export = self.export(workflow_id, "backup")?;
        let stamp = self.now().format("%Y%m%d%H%M%S");
        let path = dir.join(format!("{workflow_id}-{stamp}.json.zst"));

        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_vec_pretty(&export)?;
        let compressed = zstd::encode_all(json.as_slice(), BACKUP_COMPRESSION_LEVEL)
            .map_err(StateError::Io)?;
        std::fs::write(&path, compressed)?;
        tracing::debug!(workflow_id, path = %path.display(), "backup written");
        Ok(path)
    }

    /// Restore a backup artifact under the same `overwrite` rule as import.
    /// Returns the restored workflow id.
    pub fn restore(&self, artifact: &Path, overwrite: bool) -> Result<String, StateError> {
        let compressed = std::fs::read(artifact)?;
        let json = zstd::decode_all(compressed.as_slice())?;
        let export: WorkflowStateExport = serde_json::from_slice(&json)?;
        let workflow_id = export.state.id.clone();
        self.import(export, overwrite)?;
        Ok(workflow_id)
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
