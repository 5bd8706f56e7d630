// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drift detection through the wire surface.

use crate::prelude::TestMaster;
use sloth_core::{Resource, ResourceAction, WorkflowState};
use sloth_wire::{Request, Response, StateRequest};

#[tokio::test]
async fn drift_detection_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let master = TestMaster::start(tmp.path()).await;
    let client = master.client();

    client
        .call(&Request::State {
            request: StateRequest::Create {
                state: WorkflowState::new("w1", "deploy", chrono::Utc::now()),
            },
        })
        .await
        .unwrap();
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

    // expected 3 replicas, actual 5 → drifted
    let response = client
        .call(&Request::State {
            request: StateRequest::DetectDrift {
                id: "w1".to_string(),
                resource_id: "r1".to_string(),
                expected: serde_json::json!({"replicas": 3}),
                actual: serde_json::json!({"replicas": 5}),
            },
        })
        .await
        .unwrap();
    match response {
        Response::DriftResult { drift } => {
            assert!(drift.drifted);
            assert_eq!(drift.resource_type, "Deployment");
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let response = client
        .call(&Request::State {
            request: StateRequest::Drift {
                id: "w1".to_string(),
            },
        })
        .await
        .unwrap();
    match response {
        Response::Drifts { drifts } => {
            assert_eq!(drifts.len(), 1);
            assert_eq!(drifts[0].resource_id, "r1");
            assert_eq!(drifts[0].expected, serde_json::json!({"replicas": 3}));
            assert_eq!(drifts[0].actual, serde_json::json!({"replicas": 5}));
        }
        other => panic!("unexpected response: {other:?}"),
    }
}
