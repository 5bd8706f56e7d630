// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry handlers.

use crate::lifecycle::MasterCtx;
use sloth_wire::Response;

pub(super) fn register(ctx: &MasterCtx, name: &str, address: &str) -> Response {
    match ctx.registry.register(name, address) {
        Ok(record) => Response::Agent {
            record: Box::new(record),
        },
        Err(e) => Response::error(e),
    }
}

pub(super) fn heartbeat(ctx: &MasterCtx, name: &str) -> Response {
    match ctx.registry.heartbeat(name) {
        Ok(()) => Response::Ok,
        Err(e) => Response::error(e),
    }
}

pub(super) fn update_system_info(
    ctx: &MasterCtx,
    name: &str,
    info: serde_json::Value,
) -> Response {
    match ctx.registry.update_system_info(name, info) {
        Ok(()) => Response::Ok,
        Err(e) => Response::error(e),
    }
}

pub(super) fn update_version(ctx: &MasterCtx, name: &str, version: &str) -> Response {
    match ctx.registry.update_version(name, version) {
        Ok(()) => Response::Ok,
        Err(e) => Response::error(e),
    }
}

pub(super) fn unregister(ctx: &MasterCtx, name: &str) -> Response {
    match ctx.registry.unregister(name) {
        Ok(()) => Response::Ok,
        Err(e) => Response::error(e),
    }
}

pub(super) fn save_metrics(ctx: &MasterCtx, name: &str, samples: [f64; 6]) -> Response {
    let [cpu, memory, disk, load_1, load_5, load_15] = samples;
    match ctx
        .registry
        .save_metrics(name, cpu, memory, disk, load_1, load_5, load_15)
    {
        Ok(()) => Response::Ok,
        Err(e) => Response::error(e),
    }
}

pub(super) fn list(ctx: &MasterCtx) -> Response {
    Response::Agents {
        records: ctx.registry.list(),
    }
}

pub(super) fn get(ctx: &MasterCtx, name: &str) -> Response {
    match ctx.registry.get(name) {
        Ok(record) => Response::Agent {
            record: Box::new(record),
        },
        Err(e) => Response::error(e),
    }
}

pub(super) fn metrics_history(ctx: &MasterCtx, name: &str, limit: usize) -> Response {
    Response::Metrics {
        samples: ctx.registry.metrics_history(name, limit),
    }
}

pub(super) fn cleanup_inactive(ctx: &MasterCtx, max_hours: u64) -> Response {
    match ctx.registry.cleanup_inactive(max_hours) {
        Ok(count) => Response::Removed {
            count: count as u64,
        },
        Err(e) => Response::error(e),
    }
}
