// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CPU, memory, and disk watchers: percent samples against a threshold.

use super::{CheckError, Emission, WatcherState};
use crate::probe;
use serde_json::json;
use sloth_core::{EventCondition, WatcherConfig};
use std::path::Path;

pub(super) fn check_cpu(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let counters = probe::cpu_counters()?;
    let previous = state.cpu_counters.replace(counters);

    // The first sample only establishes the delta baseline
    let Some(previous) = previous else {
        return Ok(Vec::new());
    };
    let Some(percent) = probe::cpu_percent_between(previous, counters) else {
        return Ok(Vec::new());
    };

    Ok(evaluate("cpu", percent, config, state))
}

pub(super) fn check_memory(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let percent = probe::memory_percent()?;
    Ok(evaluate("memory", percent, config, state))
}

pub(super) fn check_disk(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let percent = probe::disk_percent(Path::new(&config.file_path))?;
    Ok(evaluate("disk", percent, config, state))
}

/// Threshold and trend conditions shared by the three percent watchers.
fn evaluate(
    kind: &str,
    value: f64,
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Vec<Emission> {
    let mut out = Vec::new();

    if config.has_condition(EventCondition::Above) && value > config.threshold {
        out.push(Emission::new(
            format!("{kind}.high_usage"),
            json!({"usage_percent": value, "threshold": config.threshold}),
        ));
    }
    if config.has_condition(EventCondition::Below) && value < config.threshold {
        out.push(Emission::new(
            format!("{kind}.low_usage"),
            json!({"usage_percent": value, "threshold": config.threshold}),
        ));
    }

    if let Some(last_value) = state.last_value {
        if config.has_condition(EventCondition::Increased) && value > last_value {
            out.push(Emission::new(
                format!("{kind}.increased"),
                json!({"old_percent": last_value, "new_percent": value}),
            ));
        }
        if config.has_condition(EventCondition::Decreased) && value < last_value {
            out.push(Emission::new(
                format!("{kind}.decreased"),
                json!({"old_percent": last_value, "new_percent": value}),
            ));
        }
    }

    state.last_value = Some(value);
    out
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
