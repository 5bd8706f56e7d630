// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::WatcherState;
use super::*;
use sloth_core::WatcherType;

#[test]
fn port_table_matching_is_by_local_address_column() {
    let table = "  sl  local_address rem_address   st\n\
                 0: 00000000:1F90 00000000:0000 0A\n\
                 1: 0100007F:0050 00000000:0000 0A\n";

    assert!(table_has_port(table, 8080)); // 0x1F90
    assert!(table_has_port(table, 80)); // 0x0050
    assert!(!table_has_port(table, 443));
}

#[test]
fn port_match_does_not_hit_remote_addresses() {
    let table = "  sl  local_address rem_address   st\n\
                 0: 00000000:0050 0100007F:1F90 01\n";
    assert!(!table_has_port(table, 8080));
}

#[test]
fn finds_the_current_test_process() {
    let exe = std::env::current_exe().unwrap();
    let name = exe.file_name().unwrap().to_string_lossy().to_string();

    let pid = find_process(&name).unwrap();
    assert!(pid.is_some());
}

#[test]
fn missing_process_is_not_running() {
    assert!(find_process("definitely-not-a-real-process-name")
        .unwrap()
        .is_none());
}

#[test]
fn process_transitions_gate_on_conditions() {
    let exe = std::env::current_exe().unwrap();
    let name = exe.file_name().unwrap().to_string_lossy().to_string();

    let mut config = WatcherConfig::new(
        WatcherType::Process,
        vec![EventCondition::Created, EventCondition::Deleted],
    );
    config.process_name = name;

    let mut state = WatcherState::default();

    // First check baselines: the process is already running, no event
    assert!(check_process(&config, &mut state).unwrap().is_empty());
    state.initialized = true;
    assert!(state.last_running);

    // Simulate the process having been seen as stopped, then starting
    state.last_running = false;
    let emissions = check_process(&config, &mut state).unwrap();
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "process.started");
    assert!(emissions[0].data["pid"].is_i64());
}

#[test]
fn stopped_process_emits_on_deleted() {
    let mut config = WatcherConfig::new(WatcherType::Process, vec![EventCondition::Deleted]);
    config.process_name = "definitely-not-a-real-process-name".to_string();

    let mut state = WatcherState {
        initialized: true,
        last_running: true,
        last_pid: Some(12345),
        ..Default::default()
    };

    let emissions = check_process(&config, &mut state).unwrap();
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].event_type, "process.stopped");
    assert_eq!(emissions[0].data["pid"], 12345);
    assert!(!state.last_running);
}
