// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical workflow lifecycle: create, run, mutate resources,
//! finish, roll back, all through the master's wire surface.

use crate::prelude::TestMaster;
use sloth_core::{Resource, ResourceAction, WorkflowState, WorkflowStatus};
use sloth_wire::{Request, Response, StateRequest};

async fn get_workflow(master: &TestMaster, id: &str) -> WorkflowState {
    let response = master
        .client()
        .call(&Request::State {
            request: StateRequest::Get { id: id.to_string() },
        })
        .await
        .unwrap();
    match response {
        Response::Workflow { state } => *state,
        other => panic!("unexpected response: {other:?}"),
    }
}

async fn update_workflow(master: &TestMaster, state: WorkflowState, description: &str) -> u32 {
    let response = master
        .client()
        .call(&Request::State {
            request: StateRequest::Update {
                state,
                description: description.to_string(),
            },
        })
        .await
        .unwrap();
    match response {
        Response::Version { version } => version,
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn create_update_rollback() {
    let tmp = tempfile::tempdir().unwrap();
    let master = TestMaster::start(tmp.path()).await;
    let client = master.client();

    // Create: pending at version 1
    let state = WorkflowState::new("w1", "deploy", chrono::Utc::now());
    client
        .call(&Request::State {
            request: StateRequest::Create { state },
        })
        .await
        .unwrap();

    // Update to running: version 2
    let mut state = get_workflow(&master, "w1").await;
    state.status = WorkflowStatus::Running;
    assert_eq!(update_workflow(&master, state, "start run").await, 2);

    // A task adds a resource to the current row
    master
        .daemon
        .ctx
        .engine
        .add_resource(
            "w1",
            Resource {
                id: "r1".to_string(),
                workflow_id: String::new(),
                resource_type: "Deployment".to_string(),
                name: "api".to_string(),
                action: ResourceAction::Create,
                status: String::new(),
                attributes: serde_json::json!({"replicas": 3}),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        )
        .unwrap();

    // Finish successfully: version 3
    let mut state = get_workflow(&master, "w1").await;
    state.complete(WorkflowStatus::Success, chrono::Utc::now());
    assert_eq!(update_workflow(&master, state, "finished").await, 3);
    assert_eq!(get_workflow(&master, "w1").await.resources.len(), 1);

    // Roll back to version 1
    let response = client
        .call(&Request::State {
            request: StateRequest::Rollback {
                id: "w1".to_string(),
                version: 1,
            },
        })
        .await
        .unwrap();
    assert_eq!(response, Response::Version { version: 4 });

    // Current row reflects v1 under a new version and rolled_back status
    let rolled = get_workflow(&master, "w1").await;
    assert_eq!(rolled.status, WorkflowStatus::RolledBack);
    assert_eq!(rolled.version, 4);
    assert!(rolled.resources.is_empty());

    // The whole history chain is preserved
    let response = client
        .call(&Request::State {
            request: StateRequest::Versions {
                id: "w1".to_string(),
            },
        })
        .await
        .unwrap();
    match response {
        Response::Versions { versions } => {
            let numbers: Vec<u32> = versions.iter().map(|v| v.version).collect();
            assert_eq!(numbers, vec![1, 2, 3, 4]);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn version_numbers_survive_a_master_restart() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let master = TestMaster::start(tmp.path()).await;
        master
            .client()
            .call(&Request::State {
                request: StateRequest::Create {
                    state: WorkflowState::new("w1", "deploy", chrono::Utc::now()),
                },
            })
            .await
            .unwrap();
        let mut state = get_workflow(&master, "w1").await;
        state.status = WorkflowStatus::Running;
        update_workflow(&master, state, "").await;
        master.daemon.shutdown();
    }

    let master = TestMaster::start(tmp.path()).await;
    let state = get_workflow(&master, "w1").await;
    assert_eq!(state.version, 2);
    assert_eq!(state.status, WorkflowStatus::Running);
}
