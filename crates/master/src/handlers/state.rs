// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow state engine handlers.

use crate::lifecycle::MasterCtx;
use sloth_wire::{Response, StateRequest};
use std::time::Duration;

pub(super) fn handle(ctx: &MasterCtx, request: StateRequest) -> Response {
    let engine = &ctx.engine;
    match request {
        StateRequest::List { name, status } => {
            let status = match status.as_deref().map(str::parse) {
                None => None,
                Some(Ok(status)) => Some(status),
                Some(Err(e)) => return Response::error(e),
            };
            Response::Workflows {
                states: engine.list(name.as_deref(), status),
            }
        }
        StateRequest::Get { id } => match engine.get(&id) {
            Ok(state) => Response::Workflow {
                state: Box::new(state),
            },
            Err(e) => Response::error(e),
        },
        StateRequest::GetByName { name } => match engine.get_by_name(&name) {
            Ok(state) => Response::Workflow {
                state: Box::new(state),
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Create { state } => match engine.create(state) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        StateRequest::Update { state, description } => {
            match engine.update(state, description) {
                Ok(version) => Response::Version { version },
                Err(e) => Response::error(e),
            }
        }
        StateRequest::Delete { id } => match engine.delete(&id) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        StateRequest::Resources { id } => match engine.get(&id) {
            Ok(state) => Response::Resources {
                resources: state.resources,
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Outputs { id } => match engine.get(&id) {
            Ok(state) => Response::Outputs {
                outputs: state.outputs,
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Versions { id } => match engine.versions(&id) {
            Ok(versions) => Response::Versions { versions },
            Err(e) => Response::error(e),
        },
        StateRequest::Rollback { id, version } => match engine.rollback(&id, version) {
            Ok(new_version) => Response::Version {
                version: new_version,
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Drift { id } => match engine.drift_detections(&id) {
            Ok(drifts) => Response::Drifts { drifts },
            Err(e) => Response::error(e),
        },
        StateRequest::DetectDrift {
            id,
            resource_id,
            expected,
            actual,
        } => match engine.detect_drift(&id, &resource_id, expected, actual) {
            Ok(drift) => Response::DriftResult {
                drift: Box::new(drift),
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Diff {
            id,
            from_version,
            to_version,
        } => match engine.diff(&id, from_version, to_version) {
            Ok(diff) => Response::Diff {
                diff: Box::new(diff),
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Export { id } => match engine.export(&id, "rpc") {
            Ok(export) => Response::Export {
                export: Box::new(export),
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Import { export, overwrite } => match engine.import(*export, overwrite) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        StateRequest::Backup { id, dir } => match engine.backup(&id, &dir) {
            Ok(path) => Response::Artifact { path },
            Err(e) => Response::error(e),
        },
        StateRequest::Restore {
            artifact,
            overwrite,
        } => match engine.restore(&artifact, overwrite) {
            Ok(id) => Response::WorkflowId { id },
            Err(e) => Response::error(e),
        },
        StateRequest::Search { query } => Response::Workflows {
            states: engine.search(&query),
        },
        StateRequest::Prune {
            older_than_secs,
            keep_successful,
        } => match engine.prune(Duration::from_secs(older_than_secs), keep_successful) {
            Ok(count) => Response::Removed {
                count: count as u64,
            },
            Err(e) => Response::error(e),
        },
        StateRequest::Analytics => Response::Analytics {
            analytics: Box::new(engine.analytics()),
        },
        StateRequest::TagAdd { id, tag } => match engine.add_tag(&id, &tag) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        StateRequest::TagRemove { id, tag } => match engine.remove_tag(&id, &tag) {
            Ok(()) => Response::Ok,
            Err(e) => Response::error(e),
        },
        StateRequest::Tags { id } => match engine.tags(&id) {
            Ok(tags) => Response::Tags { tags },
            Err(e) => Response::error(e),
        },
    }
}
