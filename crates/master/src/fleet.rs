// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task dispatch: resolve an agent through the registry and forward the
//! task to its listener.

use sloth_core::SystemClock;
use sloth_registry::AgentRegistry;
use sloth_wire::{Client, Request, Response, TaskPayload, WireError};
use std::time::Duration;
use tracing::info;

/// Margin on top of the task's own timeout for transport overhead.
const DISPATCH_MARGIN: Duration = Duration::from_secs(5);
/// Agent-side default when the payload carries no timeout.
const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

/// Forward `payload` to `agent`, which must be live per the 60 s rule.
pub async fn dispatch_task(
    registry: &AgentRegistry<SystemClock>,
    agent: &str,
    payload: TaskPayload,
) -> Response {
    let address = match registry.agent_address(agent) {
        Ok(address) => address,
        Err(e) => return Response::error(e),
    };

    let task_timeout = if payload.timeout_secs == 0 {
        DEFAULT_TASK_TIMEOUT
    } else {
        Duration::from_secs(payload.timeout_secs)
    };

    info!(agent, address = %address, command = %payload.command, "dispatching task");

    let client = Client::new(address).with_timeout(task_timeout + DISPATCH_MARGIN);
    match client.call(&Request::RunTask { payload }).await {
        Ok(response) => response,
        Err(WireError::Remote(message)) => Response::Error { message },
        Err(e) => Response::error(format!("dispatch to agent '{agent}' failed: {e}")),
    }
}
