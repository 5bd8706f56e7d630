// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::engine::StateError;
use sloth_core::{FakeClock, Resource, ResourceAction, WorkflowState};

fn setup(dir: &std::path::Path) -> StateEngine<FakeClock> {
    let clock = FakeClock::new();
    let engine = StateEngine::open(dir, clock.clone()).unwrap();
    engine
        .create(WorkflowState::new("w1", "deploy", clock.now()))
        .unwrap();
    engine
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
                created_at: clock.now(),
                updated_at: clock.now(),
            },
        )
        .unwrap();
    engine
}

#[test]
fn differing_values_are_drifted() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = setup(tmp.path());

    let drift = engine
        .detect_drift(
            "w1",
            "r1",
            serde_json::json!({"replicas": 3}),
            serde_json::json!({"replicas": 5}),
        )
        .unwrap();

    assert!(drift.drifted);
    assert_eq!(drift.resource_type, "Deployment");

    let detections = engine.drift_detections("w1").unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].id, drift.id);
}

#[test]
fn equal_values_are_not_drifted() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = setup(tmp.path());

    let drift = engine
        .detect_drift(
            "w1",
            "r1",
            serde_json::json!({"replicas": 3}),
            serde_json::json!({"replicas": 3}),
        )
        .unwrap();
    assert!(!drift.drifted);
}

#[test]
fn key_order_does_not_matter() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = setup(tmp.path());

    let expected: serde_json::Value =
        serde_json::from_str(r#"{"a": 1, "b": {"c": 2, "d": 3}}"#).unwrap();
    let actual: serde_json::Value =
        serde_json::from_str(r#"{"b": {"d": 3, "c": 2}, "a": 1}"#).unwrap();

    let drift = engine.detect_drift("w1", "r1", expected, actual).unwrap();
    assert!(!drift.drifted);
}

#[test]
fn numeric_type_differences_are_drift() {
    // Strict structural equality: integer 1 and float 1.0 differ
    let tmp = tempfile::tempdir().unwrap();
    let engine = setup(tmp.path());

    let drift = engine
        .detect_drift(
            "w1",
            "r1",
            serde_json::json!({"replicas": 1}),
            serde_json::json!({"replicas": 1.0}),
        )
        .unwrap();
    assert!(drift.drifted);
}

#[test]
fn unknown_resource_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = setup(tmp.path());

    let err = engine
        .detect_drift("w1", "ghost", serde_json::json!({}), serde_json::json!({}))
        .unwrap_err();
    assert!(matches!(err, StateError::ResourceNotFound(_)));

    let err = engine
        .detect_drift("ghost", "r1", serde_json::json!({}), serde_json::json!({}))
        .unwrap_err();
    assert!(matches!(err, StateError::WorkflowNotFound(_)));
}

#[test]
fn detections_are_newest_first() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = setup(tmp.path());

    let first = engine
        .detect_drift("w1", "r1", serde_json::json!(1), serde_json::json!(1))
        .unwrap();
    let second = engine
        .detect_drift("w1", "r1", serde_json::json!(1), serde_json::json!(2))
        .unwrap();

    let detections = engine.drift_detections("w1").unwrap();
    assert_eq!(detections[0].id, second.id);
    assert_eq!(detections[1].id, first.id);
}
