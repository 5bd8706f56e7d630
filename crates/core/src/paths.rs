// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-directory and master-address resolution.
//!
//! Everything is environment-first with filesystem fallbacks, so tests and
//! multi-instance setups can relocate all durable state with one variable.

use std::path::{Path, PathBuf};

/// Overrides the data directory holding all master/CLI stores.
pub const DATA_DIR_ENV: &str = "SLOTH_RUNNER_DATA_DIR";
/// Overrides master address resolution entirely.
pub const MASTER_ADDR_ENV: &str = "SLOTH_RUNNER_MASTER_ADDR";
/// Overrides the agent-side watcher store path.
pub const WATCHER_DB_ENV: &str = "SLOTH_RUNNER_WATCHER_DB";

/// Fallback master address when neither env nor `master.conf` is present.
pub const DEFAULT_MASTER_ADDR: &str = "localhost:50051";

const SYSTEM_DATA_DIR: &str = "/etc/sloth-runner";
const SYSTEM_WATCHER_DIR: &str = "/var/lib/sloth-runner";

/// Resolve the data directory.
///
/// Priority: `SLOTH_RUNNER_DATA_DIR` → `/etc/sloth-runner` when writable by
/// the current user → `$HOME/.sloth-runner`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    let system = PathBuf::from(SYSTEM_DATA_DIR);
    if dir_writable(&system) {
        return system;
    }

    match dirs::home_dir() {
        Some(home) => home.join(".sloth-runner"),
        None => PathBuf::from(".sloth-runner"),
    }
}

/// Resolve the master address.
///
/// Priority: `SLOTH_RUNNER_MASTER_ADDR` → whole-file content of
/// `<data_dir>/master.conf` (trimmed) → `localhost:50051`.
pub fn master_address() -> String {
    if let Ok(addr) = std::env::var(MASTER_ADDR_ENV) {
        if !addr.is_empty() {
            return addr;
        }
    }

    let conf = data_dir().join("master.conf");
    if let Ok(content) = std::fs::read_to_string(&conf) {
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    DEFAULT_MASTER_ADDR.to_string()
}

/// Resolve the agent-side watcher store path (the snapshot file; the WAL
/// lives alongside it).
///
/// Priority: `SLOTH_RUNNER_WATCHER_DB` → `/var/lib/sloth-runner/watchers.db`
/// as root → `~/.local/share/sloth-runner/watchers.db`.
pub fn watcher_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(WATCHER_DB_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if nix::unistd::Uid::effective().is_root() {
        return PathBuf::from(SYSTEM_WATCHER_DIR).join("watchers.db");
    }

    match dirs::data_local_dir() {
        Some(dir) => dir.join("sloth-runner").join("watchers.db"),
        None => PathBuf::from(".sloth-runner").join("watchers.db"),
    }
}

/// True when the directory exists (or can be created) and a probe file can
/// be written into it.
fn dir_writable(path: &Path) -> bool {
    if std::fs::create_dir_all(path).is_err() {
        return false;
    }
    let probe = path.join(".sloth-probe");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
