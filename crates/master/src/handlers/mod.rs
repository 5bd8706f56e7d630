// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handlers, grouped by concern.
//!
//! Every handler converts its component's error into `Response::Error`, so
//! the listener never has to unwind a failed request.

mod agents;
mod kv;
mod state;

use crate::fleet;
use crate::lifecycle::MasterCtx;
use sloth_wire::{Request, Response, PROTOCOL_VERSION};

/// Handle one request against the shared master context.
pub async fn handle_request(ctx: &MasterCtx, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        // -- agent control plane --
        Request::RegisterAgent { name, address } => agents::register(ctx, &name, &address),
        Request::Heartbeat { name } => agents::heartbeat(ctx, &name),
        Request::UpdateSystemInfo { name, info } => agents::update_system_info(ctx, &name, info),
        Request::UpdateAgentVersion { name, version } => {
            agents::update_version(ctx, &name, &version)
        }
        Request::UnregisterAgent { name } => agents::unregister(ctx, &name),
        Request::SaveMetrics {
            name,
            cpu_percent,
            memory_percent,
            disk_percent,
            load_1,
            load_5,
            load_15,
        } => agents::save_metrics(
            ctx,
            &name,
            [
                cpu_percent,
                memory_percent,
                disk_percent,
                load_1,
                load_5,
                load_15,
            ],
        ),
        Request::ListAgents => agents::list(ctx),
        Request::GetAgent { name } => agents::get(ctx, &name),
        Request::MetricsHistory { name, limit } => agents::metrics_history(ctx, &name, limit),
        Request::CleanupInactiveAgents { max_hours } => agents::cleanup_inactive(ctx, max_hours),

        // -- event ingest --
        Request::SendEventBatch { events, batch_size } => {
            let _ = batch_size; // advisory; the sink accepts any size
            let outcome = ctx.ingest.handle_batch(events);
            Response::EventBatch {
                success: outcome.success,
                events_processed: outcome.events_processed,
                failed_event_ids: outcome.failed_event_ids,
                message: outcome.message,
            }
        }
        Request::RecentEvents {
            stack,
            run_id,
            limit,
        } => Response::Events {
            events: ctx
                .ingest
                .recent(stack.as_deref(), run_id.as_deref(), limit),
        },

        // -- task dispatch --
        Request::DispatchTask { agent, payload } => {
            fleet::dispatch_task(&ctx.registry, &agent, payload).await
        }
        Request::RunTask { .. } => {
            Response::error("run_task is handled by agents; use dispatch_task on the master")
        }

        // -- stores --
        Request::State { request } => state::handle(ctx, request),
        Request::Kv { request } => kv::handle(ctx, request),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
