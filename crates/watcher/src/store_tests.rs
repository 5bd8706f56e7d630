// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sloth_core::{EventCondition, WatcherType};

fn file_config(path: &str) -> WatcherConfig {
    let mut config = WatcherConfig::new(
        WatcherType::File,
        vec![EventCondition::Created, EventCondition::Changed],
    );
    config.file_path = path.to_string();
    config
}

#[test]
fn register_validates_and_returns_the_id() {
    let tmp = tempfile::tempdir().unwrap();
    let store = WatcherStore::open(tmp.path()).unwrap();

    let config = file_config("/tmp/watched");
    let id = store.register(config.clone()).unwrap();
    assert_eq!(id, config.id);
    assert_eq!(store.get(id.as_str()).unwrap(), config);
}

#[test]
fn invalid_configs_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let store = WatcherStore::open(tmp.path()).unwrap();

    let invalid = WatcherConfig::new(WatcherType::File, vec![EventCondition::Created]);
    assert!(matches!(
        store.register(invalid),
        Err(WatcherStoreError::Config(_))
    ));
    assert!(store.list().is_empty());
}

#[test]
fn unregister_unknown_id_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let store = WatcherStore::open(tmp.path()).unwrap();

    let err = store.unregister("ghost").unwrap_err();
    assert_eq!(err.to_string(), "watcher not found: ghost");
}

#[test]
fn unregister_removes_the_config() {
    let tmp = tempfile::tempdir().unwrap();
    let store = WatcherStore::open(tmp.path()).unwrap();

    let id = store.register(file_config("/tmp/a")).unwrap();
    store.unregister(id.as_str()).unwrap();
    assert!(store.list().is_empty());
    assert!(matches!(
        store.get(id.as_str()),
        Err(WatcherStoreError::NotFound(_))
    ));
}

#[test]
fn configs_have_infinite_lifecycle_across_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let id = {
        let store = WatcherStore::open(tmp.path()).unwrap();
        store.register(file_config("/tmp/a")).unwrap()
    };

    let store = WatcherStore::open(tmp.path()).unwrap();
    let configs = store.list();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].id, id);
}

#[test]
fn open_at_uses_sibling_wal_path() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("watchers.db");

    let store = WatcherStore::open_at(&db_path).unwrap();
    store.register(file_config("/tmp/a")).unwrap();
    assert!(db_path.with_extension("wal").exists());

    store.checkpoint().unwrap();
    assert!(db_path.exists());
}
