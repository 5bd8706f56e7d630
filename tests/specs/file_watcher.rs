// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-watcher transitions flowing through the full agent-side chain:
//! watcher manager → event worker → master ingest, over real TCP and a
//! real 1-second check cadence.

use crate::prelude::TestMaster;
use sloth_agent::event_worker::{EventWorker, WireTransport};
use sloth_core::{Event, EventCondition, WatcherConfig, WatcherType};
use sloth_watcher::{EventSink, WatcherManager, WatcherStore};
use sloth_wire::{Request, Response};
use std::sync::Arc;
use std::time::Duration;

async fn events(master: &TestMaster) -> Vec<Event> {
    let response = master
        .client()
        .call(&Request::RecentEvents {
            stack: Some("prod".to_string()),
            run_id: None,
            limit: 0,
        })
        .await
        .unwrap();
    match response {
        Response::Events { events } => events,
        other => panic!("unexpected response: {other:?}"),
    }
}

/// Wait until the master has seen `count` events (or time out).
async fn wait_for_events(master: &TestMaster, count: usize) -> Vec<Event> {
    for _ in 0..80 {
        let seen = events(master).await;
        if seen.len() >= count {
            return seen;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("master never saw {count} events");
}

#[tokio::test(flavor = "multi_thread")]
async fn file_watcher_transitions() {
    let tmp = tempfile::tempdir().unwrap();
    let master = TestMaster::start(tmp.path()).await;

    // Agent side: batch size 1 so every emission ships immediately
    let transport = Arc::new(WireTransport::new(master.address.clone(), 1));
    let worker = EventWorker::with_config("agent-1", transport, 1, Duration::from_secs(3600));

    let store = WatcherStore::open(tmp.path()).unwrap();
    let manager = WatcherManager::new(store, Arc::new(worker.clone()) as Arc<dyn EventSink>);

    let path = tmp.path().join("watched-file");
    let mut config = WatcherConfig::new(
        WatcherType::File,
        vec![
            EventCondition::Created,
            EventCondition::Changed,
            EventCondition::Deleted,
        ],
    );
    config.file_path = path.to_string_lossy().to_string();
    config.check_hash = true;
    config.interval_secs = 1;
    config.stack = "prod".to_string();
    config.run_id = "run-1".to_string();
    manager.register(config).unwrap();

    // Baseline tick with no file: nothing emitted
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(events(&master).await.is_empty());

    // touch → file.created
    std::fs::write(&path, b"").unwrap();
    let seen = wait_for_events(&master, 1).await;
    assert_eq!(seen[0].event_type, "file.created");
    assert_eq!(seen[0].stack, "prod");
    assert_eq!(seen[0].run_id, "run-1");

    // append → file.modified with new size and hash
    std::fs::write(&path, b"hi\n").unwrap();
    let seen = wait_for_events(&master, 2).await;
    assert_eq!(seen[0].event_type, "file.modified");
    let data: serde_json::Value = serde_json::from_str(&seen[0].data).unwrap();
    assert_eq!(data["new_size"], 3);
    assert!(data["new_hash"].is_string());
    assert!(data["watcher_id"].is_string());

    // rm → file.deleted
    std::fs::remove_file(&path).unwrap();
    let seen = wait_for_events(&master, 3).await;
    assert_eq!(seen[0].event_type, "file.deleted");

    manager.stop().await;
    worker.stop().await;
}
