// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Round-trip and idempotence laws.

use sloth_core::{Clock, FakeClock, WorkflowState, WorkflowStatus};
use sloth_state::StateEngine;
use sloth_storage::{KvError, KvStore};
use std::time::Duration;

fn seeded_engine(dir: &std::path::Path) -> StateEngine<FakeClock> {
    let clock = FakeClock::new();
    let engine = StateEngine::open(dir, clock.clone()).unwrap();

    let mut state = WorkflowState::new("w1", "deploy", clock.now());
    state
        .metadata
        .insert("env".to_string(), "prod".to_string());
    engine.create(state).unwrap();
    engine.set_output("w1", "url", "https://api").unwrap();

    let mut state = engine.get("w1").unwrap();
    state.complete(WorkflowStatus::Success, clock.now());
    engine.update(state, "finished").unwrap();
    engine
}

#[test]
fn export_import_is_identity_on_observable_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = seeded_engine(tmp.path());

    let before = engine.get("w1").unwrap();
    let export = engine.export("w1", "spec").unwrap();
    engine.import(export, true).unwrap();
    let after = engine.get("w1").unwrap();

    assert_eq!(after.name, before.name);
    assert_eq!(after.version, before.version);
    assert_eq!(after.status, before.status);
    assert_eq!(after.outputs, before.outputs);
    assert_eq!(after.metadata, before.metadata);
    assert_eq!(after.resources, before.resources);
}

#[test]
fn backup_restore_is_a_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();
    let engine = seeded_engine(tmp.path());

    let before = engine.get("w1").unwrap();
    let artifact = engine.backup("w1", backups.path()).unwrap();
    engine.delete("w1").unwrap();

    engine.restore(&artifact, false).unwrap();
    let after = engine.get("w1").unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.outputs, before.outputs);

    // Versions work again after restore: the restored row has a snapshot
    assert_eq!(engine.versions("w1").unwrap().len(), 1);
}

#[test]
fn kv_laws() {
    let tmp = tempfile::tempdir().unwrap();
    let kv = KvStore::open(tmp.path(), FakeClock::new()).unwrap();

    // Set; Get == value
    kv.set("k", "v").unwrap();
    assert_eq!(kv.get("k").unwrap(), "v");

    // Set; Delete; Get → NotFound
    kv.delete("k").unwrap();
    assert!(matches!(kv.get("k"), Err(KvError::KeyNotFound(_))));

    // Increment by 0 is idempotent on the stored value
    kv.set("n", "7").unwrap();
    assert_eq!(kv.increment("n", 0).unwrap(), 7);
    assert_eq!(kv.increment("n", 0).unwrap(), 7);
    assert_eq!(kv.get("n").unwrap(), "7");

    // Lock; Unlock leaves no rows behind
    kv.lock("L", "h", Duration::from_secs(10)).unwrap();
    kv.unlock("L", "h").unwrap();
    assert_eq!(kv.lock_count(), 0);
    assert_eq!(kv.is_locked("L"), (false, String::new()));
}
