// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations.

pub mod agent;
pub mod events;
pub mod master;
pub mod run;
pub mod state;

use anyhow::bail;
use sloth_wire::{Client, Request, Response};

/// Call the master, surfacing any unexpected response shape as an error.
pub(crate) async fn call(client: &Client, request: Request) -> anyhow::Result<Response> {
    Ok(client.call(&request).await?)
}

/// Guard for handlers that expect one specific response variant.
pub(crate) fn unexpected<T>() -> anyhow::Result<T> {
    bail!("unexpected response from master")
}
