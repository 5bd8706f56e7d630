// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of tasks dispatched by the master.

use sloth_wire::TaskPayload;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Default wall-clock limit for a dispatched task.
const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from task execution
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("task timed out after {0} seconds")]
    Timeout(u64),
    #[error("failed to run task: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("{what} must not be empty")]
    Empty { what: &'static str },
}

/// Captured result of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run a task command line through the shell, with env and deadline.
pub async fn run_task(payload: &TaskPayload) -> Result<TaskOutcome, DispatchError> {
    if payload.command.is_empty() {
        return Err(DispatchError::Empty {
            what: "task command",
        });
    }

    let timeout_secs = if payload.timeout_secs == 0 {
        DEFAULT_TASK_TIMEOUT.as_secs()
    } else {
        payload.timeout_secs
    };

    info!(
        command = %payload.command,
        stack = %payload.stack,
        run_id = %payload.run_id,
        timeout_secs,
        "running dispatched task",
    );

    let mut command = tokio::process::Command::new("sh");
    command.arg("-c").arg(&payload.command);
    command.envs(&payload.env);
    command.kill_on_drop(true);

    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), command.output())
        .await
        .map_err(|_| DispatchError::Timeout(timeout_secs))??;

    Ok(TaskOutcome {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
