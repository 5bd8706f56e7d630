// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command watcher: re-run a command line and compare stdout.

use super::{CheckError, Emission, WatcherState};
use serde_json::json;
use sloth_core::{EventCondition, WatcherConfig};

pub(super) async fn check_command(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&config.command)
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    let mut out = Vec::new();
    if let Some(last_output) = &state.last_output {
        if *last_output != stdout && config.has_condition(EventCondition::Changed) {
            out.push(Emission::new(
                "command.output_changed",
                json!({
                    "command": config.command,
                    "old_output": last_output,
                    "new_output": stdout,
                }),
            ));
        }
    }

    state.last_output = Some(stdout);
    Ok(out)
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
