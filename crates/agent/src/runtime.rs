// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent runtime loops: registration, heartbeats, metrics reporting.

use crate::sysinfo;
use sloth_watcher::probe::{self, CpuCounters};
use sloth_wire::{Client, Request, WireError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Heartbeat cadence; comfortably inside the master's 60 s liveness window.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
/// Metrics reporting cadence.
const METRICS_INTERVAL: Duration = Duration::from_secs(60);

/// Master-facing identity of this agent.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub name: String,
    /// host:port other processes can reach this agent's listener at
    pub advertise_address: String,
}

/// Register with the master and report version + system info.
pub async fn register(master: &Client, identity: &AgentIdentity) -> Result<(), WireError> {
    master
        .call(&Request::RegisterAgent {
            name: identity.name.clone(),
            address: identity.advertise_address.clone(),
        })
        .await?;
    master
        .call(&Request::UpdateAgentVersion {
            name: identity.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .await?;
    master
        .call(&Request::UpdateSystemInfo {
            name: identity.name.clone(),
            info: sysinfo::collect(),
        })
        .await?;
    info!(agent = %identity.name, master = master.address(), "registered with master");
    Ok(())
}

/// Heartbeat until cancelled. Failures are logged and retried on the next
/// tick; the master will mark us Inactive if we stay unreachable.
pub async fn heartbeat_loop(master: Client, identity: AgentIdentity, token: CancellationToken) {
    let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let request = Request::Heartbeat { name: identity.name.clone() };
                if let Err(e) = master.call(&request).await {
                    warn!(error = %e, "heartbeat failed");
                }
            }
        }
    }
}

/// Report host metrics until cancelled. CPU percent is derived from the
/// delta between consecutive samples.
pub async fn metrics_loop(master: Client, identity: AgentIdentity, token: CancellationToken) {
    let mut ticker = tokio::time::interval(METRICS_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_counters: Option<CpuCounters> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let request = match sample(&mut last_counters, &identity.name) {
                    Some(request) => request,
                    None => continue, // first sample only baselines CPU
                };
                if let Err(e) = master.call(&request).await {
                    warn!(error = %e, "metrics report failed");
                }
            }
        }
    }
}

fn sample(last_counters: &mut Option<CpuCounters>, name: &str) -> Option<Request> {
    let counters = match probe::cpu_counters() {
        Ok(counters) => counters,
        Err(e) => {
            warn!(error = %e, "cpu sampling failed");
            return None;
        }
    };
    let previous = last_counters.replace(counters);
    let cpu_percent = probe::cpu_percent_between(previous?, counters)?;

    let memory_percent = probe::memory_percent().unwrap_or(0.0);
    let disk_percent = probe::disk_percent(std::path::Path::new("/")).unwrap_or(0.0);
    let (load_1, load_5, load_15) = probe::load_averages().unwrap_or((0.0, 0.0, 0.0));

    Some(Request::SaveMetrics {
        name: name.to_string(),
        cpu_percent,
        memory_percent,
        disk_percent,
        load_1,
        load_5,
        load_15,
    })
}
