// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event batching from an agent-side worker into the master's ingest,
//! across a real TCP connection.

use crate::prelude::TestMaster;
use sloth_agent::event_worker::{EventWorker, WireTransport};
use sloth_wire::{Request, Response};
use std::sync::Arc;
use std::time::Duration;

async fn received_events(master: &TestMaster) -> usize {
    let response = master
        .client()
        .call(&Request::RecentEvents {
            stack: None,
            run_id: None,
            limit: 0,
        })
        .await
        .unwrap();
    match response {
        Response::Events { events } => events.len(),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn batch_capacity_drives_delivery() {
    let tmp = tempfile::tempdir().unwrap();
    let master = TestMaster::start(tmp.path()).await;

    // batch_size 3, periodic flush effectively disabled
    let transport = Arc::new(WireTransport::new(master.address.clone(), 3));
    let worker = EventWorker::with_config("agent-1", transport, 3, Duration::from_secs(3600));

    worker
        .send_event("deploy.step", "prod", "r1", serde_json::json!({"n": 1}))
        .await
        .unwrap();
    worker
        .send_event("deploy.step", "prod", "r1", serde_json::json!({"n": 2}))
        .await
        .unwrap();

    assert_eq!(worker.buffered(), 2);
    assert_eq!(received_events(&master).await, 0);

    worker
        .send_event("deploy.step", "prod", "r1", serde_json::json!({"n": 3}))
        .await
        .unwrap();

    assert_eq!(worker.buffered(), 0);
    assert_eq!(received_events(&master).await, 3);
}

#[tokio::test]
async fn redelivered_batches_are_deduplicated() {
    let tmp = tempfile::tempdir().unwrap();
    let master = TestMaster::start(tmp.path()).await;

    let transport = Arc::new(WireTransport::new(master.address.clone(), 10));
    let worker = EventWorker::with_config("agent-1", transport, 10, Duration::from_secs(3600));

    worker
        .send_event("x", "", "", serde_json::json!({}))
        .await
        .unwrap();
    worker.flush().await.unwrap();
    assert_eq!(received_events(&master).await, 1);

    // A second flush of nothing stays at one event
    worker.flush().await.unwrap();
    assert_eq!(received_events(&master).await, 1);
}

#[tokio::test]
async fn unreachable_master_rebuffers_until_it_returns() {
    let tmp = tempfile::tempdir().unwrap();

    // Point at a dead port first
    let transport = Arc::new(WireTransport::new("127.0.0.1:1".to_string(), 10));
    let worker = EventWorker::with_config("agent-1", transport, 10, Duration::from_secs(3600));

    worker
        .send_event("held", "", "", serde_json::json!({}))
        .await
        .unwrap();
    assert!(worker.flush().await.is_err());
    assert_eq!(worker.buffered(), 1);

    // Now a live master: a worker with the same buffer drains to it
    let master = TestMaster::start(tmp.path()).await;
    let transport = Arc::new(WireTransport::new(master.address.clone(), 10));
    let recovered = EventWorker::with_config("agent-1", transport, 10, Duration::from_secs(3600));
    recovered
        .send_event("after", "", "", serde_json::json!({}))
        .await
        .unwrap();
    recovered.flush().await.unwrap();
    assert_eq!(received_events(&master).await, 1);
}
