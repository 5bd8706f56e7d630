// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service watcher: polls the system service manager for a status string.

use super::{CheckError, Emission, WatcherState};
use serde_json::json;
use sloth_core::{EventCondition, WatcherConfig};

pub(super) async fn check_service(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let status = service_status(&config.service_name).await?;
    let mut out = Vec::new();

    if state.initialized
        && status != state.last_status
        && config.has_condition(EventCondition::Changed)
    {
        out.push(Emission::new(
            "service.status_changed",
            json!({
                "service": config.service_name,
                "old_status": state.last_status,
                "new_status": status,
            }),
        ));
    }

    state.last_status = status;
    Ok(out)
}

/// Query systemd. `is-active` prints one word (`active`, `inactive`,
/// `failed`, ...) and exits non-zero for anything but active, so the exit
/// code is deliberately ignored.
async fn service_status(service: &str) -> Result<String, CheckError> {
    let output = tokio::process::Command::new("systemctl")
        .arg("is-active")
        .arg(service)
        .output()
        .await?;
    let status = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(if status.is_empty() {
        "unknown".to_string()
    } else {
        status
    })
}
