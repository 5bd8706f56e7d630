// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::{run_check, WatcherState};
use super::*;
use sloth_core::WatcherType;

fn file_config(path: &std::path::Path, check_hash: bool) -> WatcherConfig {
    let mut config = WatcherConfig::new(
        WatcherType::File,
        vec![
            EventCondition::Created,
            EventCondition::Changed,
            EventCondition::Deleted,
        ],
    );
    config.file_path = path.to_string_lossy().to_string();
    config.check_hash = check_hash;
    config
}

async fn tick(config: &WatcherConfig, state: &mut WatcherState) -> Vec<Emission> {
    run_check(config, state, None).await.unwrap()
}

#[tokio::test]
async fn file_lifecycle_created_modified_deleted() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x");
    let config = file_config(&path, true);
    let mut state = WatcherState::default();

    // Initial: no file → no event
    assert!(tick(&config, &mut state).await.is_empty());

    // touch → file.created with size
    std::fs::write(&path, b"").unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "file.created");
    assert_eq!(emissions[0].data["size"], 0);

    // append → file.modified with new size and new hash
    std::fs::write(&path, b"hi\n").unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "file.modified");
    assert_eq!(emissions[0].data["new_size"], 3);
    assert_ne!(emissions[0].data["new_hash"], emissions[0].data["old_hash"]);

    // rm → file.deleted
    std::fs::remove_file(&path).unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "file.deleted");

    // stays gone → quiet
    assert!(tick(&config, &mut state).await.is_empty());
}

#[tokio::test]
async fn preexisting_file_is_baselined_not_created() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x");
    std::fs::write(&path, b"already here").unwrap();

    let config = file_config(&path, false);
    let mut state = WatcherState::default();

    assert!(tick(&config, &mut state).await.is_empty());
    assert!(state.last_exists);

    // Unchanged file stays quiet afterwards
    assert!(tick(&config, &mut state).await.is_empty());
}

#[tokio::test]
async fn exists_condition_fires_on_first_check_only() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x");
    std::fs::write(&path, b"here").unwrap();

    let mut config = file_config(&path, false);
    config.conditions = vec![EventCondition::Exists];
    let mut state = WatcherState::default();

    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "file.exists");

    assert!(tick(&config, &mut state).await.is_empty());
}

#[tokio::test]
async fn unchanged_bytes_never_emit_with_check_hash() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x");
    std::fs::write(&path, b"stable").unwrap();

    let config = file_config(&path, true);
    let mut state = WatcherState::default();
    tick(&config, &mut state).await;

    // Refresh the mtime without changing a byte
    let now = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    let file = std::fs::File::options().append(true).open(&path).unwrap();
    file.set_modified(now).unwrap();
    drop(file);

    assert!(tick(&config, &mut state).await.is_empty());
}

#[tokio::test]
async fn mtime_counts_as_change_without_check_hash() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x");
    std::fs::write(&path, b"stable").unwrap();

    let config = file_config(&path, false);
    let mut state = WatcherState::default();
    tick(&config, &mut state).await;

    let now = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    let file = std::fs::File::options().append(true).open(&path).unwrap();
    file.set_modified(now).unwrap();
    drop(file);

    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "file.modified");
}

#[tokio::test]
async fn conditions_gate_emissions() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("x");

    // Only `deleted` configured: creation is silent
    let mut config = file_config(&path, false);
    config.conditions = vec![EventCondition::Deleted];
    let mut state = WatcherState::default();

    tick(&config, &mut state).await;
    std::fs::write(&path, b"x").unwrap();
    assert!(tick(&config, &mut state).await.is_empty());

    std::fs::remove_file(&path).unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "file.deleted");
}

#[tokio::test]
async fn directory_watcher_counts_shallow_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("watched");

    let mut config = file_config(&dir, false);
    config.watcher_type = WatcherType::Directory;
    let mut state = WatcherState::default();

    // Absent → baseline; created
    assert!(tick(&config, &mut state).await.is_empty());
    std::fs::create_dir(&dir).unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions[0].event_type, "directory.created");
    assert_eq!(emissions[0].data["file_count"], 0);

    // New entry → modified with counts
    std::fs::write(dir.join("a"), b"1").unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions[0].event_type, "directory.modified");
    assert_eq!(emissions[0].data["old_file_count"], 0);
    assert_eq!(emissions[0].data["new_file_count"], 1);

    // Nested content does not change the shallow count
    std::fs::create_dir(dir.join("sub")).unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions[0].data["new_file_count"], 2);
    std::fs::write(dir.join("sub").join("deep"), b"x").unwrap();
    assert!(tick(&config, &mut state).await.is_empty());

    // Removal → deleted
    std::fs::remove_dir_all(&dir).unwrap();
    let emissions = tick(&config, &mut state).await;
    assert_eq!(emissions[0].event_type, "directory.deleted");
}
