// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sloth_core::{AgentStatus, FakeClock, LIVENESS_WINDOW_SECS};

fn open_registry(dir: &Path) -> (AgentRegistry<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    let registry = AgentRegistry::open(dir, clock.clone()).unwrap();
    (registry, clock)
}

#[test]
fn register_creates_an_active_agent() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _clock) = open_registry(tmp.path());

    let record = registry.register("a1", "1.2.3.4:50051").unwrap();
    assert_eq!(record.name, "a1");
    assert_eq!(record.address, "1.2.3.4:50051");

    let fetched = registry.get("a1").unwrap();
    assert_eq!(fetched.status, AgentStatus::Active);
}

#[test]
fn reregister_preserves_registered_at_and_info() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("a1", "old:1").unwrap();
    registry
        .update_system_info("a1", serde_json::json!({"os": "linux"}))
        .unwrap();
    registry.update_version("a1", "1.0.0").unwrap();
    let original = registry.get("a1").unwrap();

    clock.advance_secs(3600);
    let reregistered = registry.register("a1", "new:2").unwrap();

    assert_eq!(reregistered.registered_at, original.registered_at);
    assert_eq!(reregistered.address, "new:2");
    assert_eq!(reregistered.version, "1.0.0");
    assert_eq!(reregistered.system_info, original.system_info);
    assert!(reregistered.last_heartbeat > original.last_heartbeat);
}

#[test]
fn heartbeat_keeps_an_agent_alive() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("a1", "host:1").unwrap();
    clock.advance_secs(45);
    registry.heartbeat("a1").unwrap();
    clock.advance_secs(45);

    // 45 s since last heartbeat: still active
    assert_eq!(registry.get("a1").unwrap().status, AgentStatus::Active);
}

#[test]
fn heartbeat_unknown_agent_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _clock) = open_registry(tmp.path());

    let err = registry.heartbeat("ghost").unwrap_err();
    assert_eq!(err.to_string(), "agent not found: ghost");
}

#[test]
fn liveness_window_is_strict() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("a1", "host:1").unwrap();
    clock.advance_secs(LIVENESS_WINDOW_SECS);

    // Exactly 60 s old → Inactive, regardless of the stored status
    let listed = registry.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, AgentStatus::Inactive);
}

#[test]
fn agent_address_requires_liveness() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("a1", "1.2.3.4:50051").unwrap();
    assert_eq!(registry.agent_address("a1").unwrap(), "1.2.3.4:50051");

    clock.advance_secs(61);
    let err = registry.agent_address("a1").unwrap_err();
    assert_eq!(err.to_string(), "active agent not found: a1");

    let err = registry.agent_address("ghost").unwrap_err();
    assert!(matches!(err, RegistryError::ActiveAgentNotFound(_)));
}

#[test]
fn list_sorts_by_name() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _clock) = open_registry(tmp.path());

    registry.register("bravo", "host:2").unwrap();
    registry.register("alpha", "host:1").unwrap();

    let names: Vec<String> = registry.list().into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["alpha", "bravo"]);
}

#[test]
fn remove_and_unregister_are_equivalent() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _clock) = open_registry(tmp.path());

    registry.register("a1", "host:1").unwrap();
    registry.remove("a1").unwrap();
    assert!(matches!(
        registry.get("a1"),
        Err(RegistryError::AgentNotFound(_))
    ));

    registry.register("a2", "host:2").unwrap();
    registry.unregister("a2").unwrap();
    assert!(registry.list().is_empty());

    assert!(matches!(
        registry.remove("ghost"),
        Err(RegistryError::AgentNotFound(_))
    ));
}

#[test]
fn cleanup_inactive_purges_stale_agents() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("stale", "host:1").unwrap();
    clock.advance_secs(3 * 3600);
    registry.register("fresh", "host:2").unwrap();

    let removed = registry.cleanup_inactive(2).unwrap();
    assert_eq!(removed, 1);

    let names: Vec<String> = registry.list().into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["fresh"]);
}

#[test]
fn metrics_history_is_newest_first_and_limited() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("a1", "host:1").unwrap();
    for i in 0..5 {
        registry
            .save_metrics("a1", i as f64, 50.0, 70.0, 1.0, 0.8, 0.5)
            .unwrap();
        clock.advance_secs(60);
    }

    let history = registry.metrics_history("a1", 3);
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].cpu_percent, 4.0);
    assert_eq!(history[2].cpu_percent, 2.0);

    let all = registry.metrics_history("a1", 0);
    assert_eq!(all.len(), 5);
}

#[test]
fn save_metrics_requires_a_known_agent() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, _clock) = open_registry(tmp.path());

    assert!(matches!(
        registry.save_metrics("ghost", 1.0, 1.0, 1.0, 0.0, 0.0, 0.0),
        Err(RegistryError::AgentNotFound(_))
    ));
}

#[test]
fn cleanup_old_metrics_prunes_by_age() {
    let tmp = tempfile::tempdir().unwrap();
    let (registry, clock) = open_registry(tmp.path());

    registry.register("a1", "host:1").unwrap();
    registry
        .save_metrics("a1", 1.0, 1.0, 1.0, 0.0, 0.0, 0.0)
        .unwrap();
    clock.advance_secs(8 * 86_400);
    registry
        .save_metrics("a1", 2.0, 1.0, 1.0, 0.0, 0.0, 0.0)
        .unwrap();

    let removed = registry.cleanup_old_metrics(7).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(registry.metrics_history("a1", 0).len(), 1);
}

#[test]
fn registry_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    {
        let registry = AgentRegistry::open(tmp.path(), clock.clone()).unwrap();
        registry.register("a1", "host:1").unwrap();
        registry
            .save_metrics("a1", 1.0, 2.0, 3.0, 0.1, 0.2, 0.3)
            .unwrap();
    }

    let registry = AgentRegistry::open(tmp.path(), clock).unwrap();
    assert!(registry.get("a1").is_ok());
    assert_eq!(registry.metrics_history("a1", 0).len(), 1);
}
