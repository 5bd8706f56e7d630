// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process and port watchers, backed by `/proc`.

use super::{CheckError, Emission, WatcherState};
use serde_json::json;
use sloth_core::{EventCondition, WatcherConfig};

/// "Running" means some `/proc/<pid>/cmdline` whose argv[0] basename equals
/// the configured process name.
pub(super) fn check_process(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let pid = find_process(&config.process_name)?;
    let running = pid.is_some();
    let mut out = Vec::new();

    if state.initialized {
        if running && !state.last_running && config.has_condition(EventCondition::Created) {
            out.push(Emission::new(
                "process.started",
                json!({"process_name": config.process_name, "pid": pid}),
            ));
        }
        if !running && state.last_running && config.has_condition(EventCondition::Deleted) {
            out.push(Emission::new(
                "process.stopped",
                json!({"process_name": config.process_name, "pid": state.last_pid}),
            ));
        }
    }

    state.last_running = running;
    state.last_pid = pid;
    Ok(out)
}

/// "Listening" means the hex-encoded port appears as a local address in
/// `/proc/net/tcp`.
pub(super) fn check_port(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let listening = port_listening(config.port)?;
    let mut out = Vec::new();

    if state.initialized {
        if listening && !state.last_listening && config.has_condition(EventCondition::Created) {
            out.push(Emission::new("port.opened", json!({"port": config.port})));
        }
        if !listening && state.last_listening && config.has_condition(EventCondition::Deleted) {
            out.push(Emission::new("port.closed", json!({"port": config.port})));
        }
    }

    state.last_listening = listening;
    Ok(out)
}

/// Scan `/proc` for a process whose argv[0] basename matches `name`.
fn find_process(name: &str) -> Result<Option<i32>, CheckError> {
    for entry in std::fs::read_dir("/proc")? {
        let Ok(entry) = entry else { continue };
        let file_name = entry.file_name();
        let Some(pid) = file_name.to_str().and_then(|s| s.parse::<i32>().ok()) else {
            continue;
        };

        // The process may exit between readdir and read; skip quietly
        let Ok(cmdline) = std::fs::read(format!("/proc/{pid}/cmdline")) else {
            continue;
        };
        let Some(argv0) = cmdline.split(|b| *b == 0).next() else {
            continue;
        };
        if argv0.is_empty() {
            continue;
        }

        let argv0 = String::from_utf8_lossy(argv0);
        let basename = argv0.rsplit('/').next().unwrap_or(&argv0);
        if basename == name {
            return Ok(Some(pid));
        }
    }
    Ok(None)
}

fn port_listening(port: u16) -> Result<bool, CheckError> {
    let table = std::fs::read_to_string("/proc/net/tcp")?;
    Ok(table_has_port(&table, port))
}

/// Local addresses are `hexip:hexport`; match the port column.
fn table_has_port(table: &str, port: u16) -> bool {
    let needle = format!(":{port:04X}");
    table.lines().skip(1).any(|line| {
        line.split_whitespace()
            .nth(1)
            .is_some_and(|local| local.ends_with(&needle))
    })
}

#[cfg(test)]
#[path = "proc_tests.rs"]
mod tests;
