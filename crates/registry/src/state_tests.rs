// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
}

fn sample(at: DateTime<Utc>) -> MetricsSample {
    MetricsSample {
        timestamp: at,
        cpu_percent: 10.0,
        memory_percent: 20.0,
        disk_percent: 30.0,
        load_1: 0.5,
        load_5: 0.4,
        load_15: 0.3,
    }
}

#[test]
fn put_then_heartbeat_updates_timestamps() {
    let mut state = RegistryState::default();
    state.apply(&RegistryOp::Put {
        record: AgentRecord::new("a1", "host:1", now()),
    });

    let later = now() + Duration::seconds(30);
    state.apply(&RegistryOp::Heartbeat {
        name: "a1".to_string(),
        at: later,
    });

    let agent = &state.agents["a1"];
    assert_eq!(agent.last_heartbeat, later);
    assert_eq!(agent.updated_at, later);
    assert_eq!(agent.registered_at, now());
}

#[test]
fn ops_on_unknown_agents_are_noops() {
    let mut state = RegistryState::default();
    state.apply(&RegistryOp::Heartbeat {
        name: "ghost".to_string(),
        at: now(),
    });
    state.apply(&RegistryOp::SetVersion {
        name: "ghost".to_string(),
        version: "1.0".to_string(),
        at: now(),
    });
    assert!(state.agents.is_empty());
}

#[test]
fn remove_drops_agent_and_metrics() {
    let mut state = RegistryState::default();
    state.apply(&RegistryOp::Put {
        record: AgentRecord::new("a1", "host:1", now()),
    });
    state.apply(&RegistryOp::AppendMetrics {
        name: "a1".to_string(),
        sample: sample(now()),
    });

    state.apply(&RegistryOp::Remove {
        name: "a1".to_string(),
    });
    assert!(state.agents.is_empty());
    assert!(state.metrics.is_empty());
}

#[test]
fn metrics_ring_is_bounded() {
    let mut state = RegistryState::default();
    for i in 0..(METRICS_HISTORY_LIMIT + 10) {
        state.apply(&RegistryOp::AppendMetrics {
            name: "a1".to_string(),
            sample: sample(now() + Duration::seconds(i as i64)),
        });
    }

    let ring = &state.metrics["a1"];
    assert_eq!(ring.len(), METRICS_HISTORY_LIMIT);
    // Oldest entries were evicted
    assert_eq!(ring.front().map(|s| s.timestamp), Some(now() + Duration::seconds(10)));
}

#[test]
fn prune_metrics_drops_old_samples_and_empty_rings() {
    let mut state = RegistryState::default();
    state.apply(&RegistryOp::AppendMetrics {
        name: "old".to_string(),
        sample: sample(now()),
    });
    state.apply(&RegistryOp::AppendMetrics {
        name: "fresh".to_string(),
        sample: sample(now() + Duration::days(2)),
    });

    state.apply(&RegistryOp::PruneMetrics {
        cutoff: now() + Duration::days(1),
    });

    assert!(!state.metrics.contains_key("old"));
    assert_eq!(state.metrics["fresh"].len(), 1);
}

#[test]
fn set_system_info_records_collection_time() {
    let mut state = RegistryState::default();
    state.apply(&RegistryOp::Put {
        record: AgentRecord::new("a1", "host:1", now()),
    });

    let at = now() + Duration::seconds(5);
    state.apply(&RegistryOp::SetSystemInfo {
        name: "a1".to_string(),
        info: serde_json::json!({"os": "linux"}),
        at,
    });

    let agent = &state.agents["a1"];
    assert_eq!(agent.last_info_collected, Some(at));
    assert_eq!(
        agent.system_info,
        Some(serde_json::json!({"os": "linux"}))
    );
}
