// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master lifecycle: configuration, single-instance lock, store opening,
//! and shutdown hygiene.

use crate::ingest::EventIngest;
use fs2::FileExt;
use sloth_core::{paths, SystemClock};
use sloth_registry::{AgentRegistry, RegistryError};
use sloth_state::{StateEngine, StateError};
use sloth_storage::{KvError, KvStore};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Bind address override for the master listener.
pub const BIND_ADDR_ENV: &str = "SLOTH_RUNNER_BIND_ADDR";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:50051";

/// Errors during startup/shutdown
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another master is already running (lock: {0})")]
    LockFailed(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Kv(#[from] KvError),
}

/// Resolved master configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub log_path: PathBuf,
    pub lock_path: PathBuf,
}

impl Config {
    /// Resolve from the environment: data dir per the platform rules, bind
    /// address from `SLOTH_RUNNER_BIND_ADDR` (default `0.0.0.0:50051`).
    pub fn load() -> Self {
        let data_dir = paths::data_dir();
        let bind_addr = std::env::var(BIND_ADDR_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        Self {
            log_path: data_dir.join("logs").join("master.log"),
            lock_path: data_dir.join("master.lock"),
            data_dir,
            bind_addr,
        }
    }
}

/// All shared master state handed to the listener.
pub struct MasterCtx {
    pub registry: AgentRegistry<SystemClock>,
    pub engine: StateEngine<SystemClock>,
    pub kv: KvStore<SystemClock>,
    pub ingest: EventIngest,
    pub shutdown: tokio::sync::Notify,
}

/// A running master: owns the instance lock and the component stores.
pub struct MasterDaemon {
    pub ctx: Arc<MasterCtx>,
    pub config: Config,
    /// Held for the process lifetime; releasing it frees the instance lock
    _lock_file: File,
}

impl std::fmt::Debug for MasterDaemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterDaemon")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MasterDaemon {
    /// Acquire the instance lock and open all stores.
    pub fn startup(config: Config) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(&config.data_dir)?;

        let lock_file = File::create(&config.lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(LifecycleError::LockFailed(config.lock_path.clone()));
        }

        let clock = SystemClock;
        let registry = AgentRegistry::open(&config.data_dir, clock.clone())?;
        let engine = StateEngine::open(&config.data_dir, clock.clone())?;
        let kv = KvStore::open(&config.data_dir, clock)?;

        info!(data_dir = %config.data_dir.display(), "stores opened");

        Ok(Self {
            ctx: Arc::new(MasterCtx {
                registry,
                engine,
                kv,
                ingest: EventIngest::new(),
                shutdown: tokio::sync::Notify::new(),
            }),
            config,
            _lock_file: lock_file,
        })
    }

    /// Checkpoint every store so restart replays as little WAL as possible.
    /// Best-effort: a failed checkpoint only costs recovery time.
    pub fn shutdown(&self) {
        if let Err(e) = self.ctx.registry.checkpoint() {
            warn!(error = %e, "registry checkpoint failed");
        }
        if let Err(e) = self.ctx.engine.checkpoint() {
            warn!(error = %e, "state engine checkpoint failed");
        }
        if let Err(e) = self.ctx.kv.checkpoint() {
            warn!(error = %e, "kv checkpoint failed");
        }
        info!("master stores checkpointed");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
