// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-type watcher checks.
//!
//! A check samples the host, compares against the watcher's runtime state,
//! and returns the emissions for detected transitions. The first check of a
//! watcher's life establishes the baseline and emits nothing except the
//! `exists` condition; restarts must not replay `created` for things that
//! were already there.

mod command;
mod custom;
mod fs;
mod log;
mod proc;
mod service;
mod system;

pub use custom::CustomCheck;

use crate::probe::CpuCounters;
use chrono::{DateTime, Utc};
use sloth_core::{WatcherConfig, WatcherType};
use std::time::SystemTime;
use thiserror::Error;

/// Errors from one check pass. A failed check never stops the watcher; the
/// manager logs and waits for the next tick.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One detected transition, ready to be shipped as an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Dotted event name, e.g. `file.modified`
    pub event_type: String,
    pub data: serde_json::Value,
}

impl Emission {
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }
}

/// Runtime state of one watcher. Never persisted; rebuilt from the first
/// check after restart.
#[derive(Debug, Clone, Default)]
pub struct WatcherState {
    /// False until the first check has established a baseline
    pub initialized: bool,
    pub last_check: Option<DateTime<Utc>>,

    // file / directory
    pub last_exists: bool,
    pub last_size: u64,
    pub last_mod_time: Option<SystemTime>,
    pub last_hash: String,
    pub last_file_count: usize,

    // process / port
    pub last_running: bool,
    pub last_pid: Option<i32>,
    pub last_listening: bool,

    // service
    pub last_status: String,

    // log
    pub last_position: u64,

    // command
    pub last_output: Option<String>,

    // cpu / memory / disk
    pub last_value: Option<f64>,
    pub cpu_counters: Option<CpuCounters>,
}

/// Run one check pass for `config`, mutating `state` in place.
pub async fn run_check(
    config: &WatcherConfig,
    state: &mut WatcherState,
    custom: Option<&dyn CustomCheck>,
) -> Result<Vec<Emission>, CheckError> {
    let emissions = match config.watcher_type {
        WatcherType::File => fs::check_file(config, state)?,
        WatcherType::Directory => fs::check_directory(config, state)?,
        WatcherType::Process => proc::check_process(config, state)?,
        WatcherType::Port => proc::check_port(config, state)?,
        WatcherType::Service => service::check_service(config, state).await?,
        WatcherType::Log => log::check_log(config, state)?,
        WatcherType::Command => command::check_command(config, state).await?,
        WatcherType::Cpu => system::check_cpu(config, state)?,
        WatcherType::Memory => system::check_memory(config, state)?,
        WatcherType::Disk => system::check_disk(config, state)?,
        WatcherType::Custom => custom::check_custom(config, custom),
        // Reserved types: platform-dependent, currently no-op
        WatcherType::Network
        | WatcherType::Connection
        | WatcherType::User
        | WatcherType::Package => {
            if !state.initialized {
                tracing::debug!(
                    watcher = %config.id,
                    watcher_type = %config.watcher_type,
                    "reserved watcher type has no check on this platform",
                );
            }
            Vec::new()
        }
    };

    state.initialized = true;
    state.last_check = Some(Utc::now());
    Ok(emissions)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
