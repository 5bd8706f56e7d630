// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent liveness: the 60-second rule, driven by a controllable clock.

use sloth_core::{AgentStatus, FakeClock};
use sloth_registry::{AgentRegistry, RegistryError};

#[test]
fn agent_liveness() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = AgentRegistry::open(tmp.path(), clock.clone()).unwrap();

    registry.register("a1", "1.2.3.4:50051").unwrap();
    assert_eq!(registry.get("a1").unwrap().status, AgentStatus::Active);
    assert_eq!(registry.agent_address("a1").unwrap(), "1.2.3.4:50051");

    // 61 seconds without a heartbeat
    clock.advance_secs(61);

    let listed = registry.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, AgentStatus::Inactive);

    let err = registry.agent_address("a1").unwrap_err();
    assert_eq!(err.to_string(), "active agent not found: a1");
}

#[test]
fn heartbeats_restore_liveness() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = AgentRegistry::open(tmp.path(), clock.clone()).unwrap();

    registry.register("a1", "1.2.3.4:50051").unwrap();
    clock.advance_secs(61);
    assert!(matches!(
        registry.agent_address("a1"),
        Err(RegistryError::ActiveAgentNotFound(_))
    ));

    registry.heartbeat("a1").unwrap();
    assert_eq!(registry.get("a1").unwrap().status, AgentStatus::Active);
    assert!(registry.agent_address("a1").is_ok());
}
