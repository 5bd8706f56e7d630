// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::engine::StateError;
use sloth_core::{FakeClock, Resource, ResourceAction, SearchQuery, WorkflowState};
use std::time::Duration;

fn resource(id: &str, resource_type: &str) -> Resource {
    Resource {
        id: id.to_string(),
        workflow_id: String::new(),
        resource_type: resource_type.to_string(),
        name: "api".to_string(),
        action: ResourceAction::Create,
        status: String::new(),
        attributes: serde_json::Value::Null,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

fn setup(dir: &std::path::Path) -> (StateEngine<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    let engine = StateEngine::open(dir, clock.clone()).unwrap();

    // w1: old success with a Deployment
    engine
        .create(WorkflowState::new("w1", "deploy-web", clock.now()))
        .unwrap();
    engine.add_resource("w1", resource("r1", "Deployment")).unwrap();
    let mut w1 = engine.get("w1").unwrap();
    w1.complete(WorkflowStatus::Success, clock.now());
    engine.update(w1, "").unwrap();

    // w2: old failure
    engine
        .create(WorkflowState::new("w2", "deploy-db", clock.now()))
        .unwrap();
    let mut w2 = engine.get("w2").unwrap();
    w2.error_msg = "connection refused".to_string();
    w2.complete(WorkflowStatus::Failed, clock.now());
    engine.update(w2, "").unwrap();

    // w3: recent run of deploy-web, still going
    clock.advance_secs(3600);
    engine
        .create(WorkflowState::new("w3", "deploy-web", clock.now()))
        .unwrap();
    let mut w3 = engine.get("w3").unwrap();
    w3.status = WorkflowStatus::Running;
    engine.update(w3, "").unwrap();

    (engine, clock)
}

#[test]
fn search_by_name_is_a_substring_match() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    let query = SearchQuery {
        name: Some("web".to_string()),
        ..Default::default()
    };
    let results = engine.search(&query);
    assert_eq!(results.len(), 2);
    // started_at DESC
    assert_eq!(results[0].id, "w3");
    assert_eq!(results[1].id, "w1");
}

#[test]
fn search_by_resource_type_and_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    let by_type = engine.search(&SearchQuery {
        resource_type: Some("Deployment".to_string()),
        ..Default::default()
    });
    assert_eq!(by_type.len(), 1);
    assert_eq!(by_type[0].id, "w1");

    let with_errors = engine.search(&SearchQuery {
        has_errors: Some(true),
        ..Default::default()
    });
    assert_eq!(with_errors.len(), 1);
    assert_eq!(with_errors[0].id, "w2");

    let clean = engine.search(&SearchQuery {
        has_errors: Some(false),
        ..Default::default()
    });
    assert_eq!(clean.len(), 2);
}

#[test]
fn search_limit_caps_results() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    let results = engine.search(&SearchQuery {
        limit: 1,
        ..Default::default()
    });
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "w3");
}

#[test]
fn prune_removes_old_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    // Cutoff of 30 min: w1 and w2 (1 h old) go, w3 stays
    let removed = engine.prune(Duration::from_secs(1800), false).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(engine.list(None, None).len(), 1);
    assert!(engine.get("w3").is_ok());
}

#[test]
fn prune_keep_successful_retains_successes() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    let removed = engine.prune(Duration::from_secs(1800), true).unwrap();
    assert_eq!(removed, 1);
    assert!(engine.get("w1").is_ok());
    assert!(engine.get("w2").is_err());
}

#[test]
fn prune_never_touches_locked_workflows() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    engine.lock_workflow("w2", "runner-1").unwrap();
    let removed = engine.prune(Duration::from_secs(1800), true).unwrap();
    assert_eq!(removed, 0);
    assert!(engine.get("w2").is_ok());
}

#[test]
fn analytics_aggregates_the_catalog() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    let analytics = engine.analytics();
    assert_eq!(analytics.total_workflows, 3);
    // Terminal runs: success + failed → 1 of 2 succeeded
    assert!((analytics.success_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(analytics.status_distribution["success"], 1);
    assert_eq!(analytics.status_distribution["failed"], 1);
    assert_eq!(analytics.status_distribution["running"], 1);
    assert_eq!(analytics.resource_type_distribution["Deployment"], 1);

    assert_eq!(analytics.top_workflows[0].name, "deploy-web");
    assert_eq!(analytics.top_workflows[0].executions, 2);
}

#[test]
fn analytics_on_empty_engine_is_zeroed() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = StateEngine::open(tmp.path(), FakeClock::new()).unwrap();

    let analytics = engine.analytics();
    assert_eq!(analytics.total_workflows, 0);
    assert_eq!(analytics.success_rate, 0.0);
    assert_eq!(analytics.average_duration_secs, 0.0);
    assert!(analytics.top_workflows.is_empty());
}

#[test]
fn tags_are_unique_per_workflow() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _clock) = setup(tmp.path());

    engine.add_tag("w1", "prod").unwrap();
    engine.add_tag("w1", "prod").unwrap();
    engine.add_tag("w1", "blue").unwrap();
    assert_eq!(engine.tags("w1").unwrap(), vec!["prod", "blue"]);

    engine.remove_tag("w1", "prod").unwrap();
    assert_eq!(engine.tags("w1").unwrap(), vec!["blue"]);

    // Removing an absent tag is silent; empty tags are refused
    engine.remove_tag("w1", "ghost").unwrap();
    assert!(matches!(
        engine.add_tag("w1", ""),
        Err(StateError::Empty { .. })
    ));
    assert!(matches!(
        engine.add_tag("ghost", "t"),
        Err(StateError::WorkflowNotFound(_))
    ));
}
