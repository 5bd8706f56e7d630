// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File and directory watchers.

use super::{CheckError, Emission, WatcherState};
use serde_json::json;
use sha2::{Digest, Sha256};
use sloth_core::{EventCondition, WatcherConfig};
use std::fs::Metadata;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

/// Stat the watched file and emit `file.created` / `file.deleted` /
/// `file.modified` on transitions.
///
/// With `check_hash`, content identity is authoritative for `changed`: a
/// touched mtime without a byte changing does not count as a modification.
pub(super) fn check_file(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let path = Path::new(&config.file_path);
    let meta = stat(path)?;
    let mut out = Vec::new();

    match meta {
        Some(meta) if !state.last_exists => {
            let size = meta.len();
            let hash = if config.check_hash {
                sha256_file(path)?
            } else {
                String::new()
            };

            if state.initialized {
                if config.has_condition(EventCondition::Created) {
                    out.push(Emission::new(
                        "file.created",
                        json!({"path": config.file_path, "size": size}),
                    ));
                }
            } else if config.has_condition(EventCondition::Exists) {
                out.push(Emission::new(
                    "file.exists",
                    json!({"path": config.file_path, "size": size}),
                ));
            }

            state.last_exists = true;
            state.last_size = size;
            state.last_mod_time = modified(&meta);
            state.last_hash = hash;
        }
        None if state.last_exists => {
            if config.has_condition(EventCondition::Deleted) {
                out.push(Emission::new(
                    "file.deleted",
                    json!({"path": config.file_path}),
                ));
            }
            state.last_exists = false;
            state.last_size = 0;
            state.last_mod_time = None;
            state.last_hash.clear();
        }
        Some(meta) => {
            if config.has_condition(EventCondition::Changed) {
                let size = meta.len();
                let mod_time = modified(&meta);
                let new_hash = if config.check_hash {
                    sha256_file(path)?
                } else {
                    String::new()
                };

                let changed = if config.check_hash {
                    new_hash != state.last_hash
                } else {
                    size != state.last_size || mod_time != state.last_mod_time
                };

                if changed {
                    let mut data = json!({
                        "path": config.file_path,
                        "old_size": state.last_size,
                        "new_size": size,
                        "old_mod_time": epoch_secs(state.last_mod_time),
                        "new_mod_time": epoch_secs(mod_time),
                    });
                    if config.check_hash {
                        data["old_hash"] = json!(state.last_hash);
                        data["new_hash"] = json!(new_hash);
                    }
                    out.push(Emission::new("file.modified", data));
                }

                state.last_size = size;
                state.last_mod_time = mod_time;
                state.last_hash = new_hash;
            }
        }
        None => {}
    }

    Ok(out)
}

/// Directory watcher: same existence logic; `changed` compares the shallow
/// entry count.
pub(super) fn check_directory(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let path = Path::new(&config.file_path);
    let exists = path.is_dir();
    let mut out = Vec::new();

    match (state.last_exists, exists) {
        (false, true) => {
            let file_count = entry_count(path)?;
            if state.initialized {
                if config.has_condition(EventCondition::Created) {
                    out.push(Emission::new(
                        "directory.created",
                        json!({"path": config.file_path, "file_count": file_count}),
                    ));
                }
            } else if config.has_condition(EventCondition::Exists) {
                out.push(Emission::new(
                    "directory.exists",
                    json!({"path": config.file_path, "file_count": file_count}),
                ));
            }
            state.last_exists = true;
            state.last_file_count = file_count;
        }
        (true, false) => {
            if config.has_condition(EventCondition::Deleted) {
                out.push(Emission::new(
                    "directory.deleted",
                    json!({"path": config.file_path}),
                ));
            }
            state.last_exists = false;
            state.last_file_count = 0;
        }
        (true, true) => {
            if config.has_condition(EventCondition::Changed) {
                let file_count = entry_count(path)?;
                if file_count != state.last_file_count {
                    out.push(Emission::new(
                        "directory.modified",
                        json!({
                            "path": config.file_path,
                            "old_file_count": state.last_file_count,
                            "new_file_count": file_count,
                        }),
                    ));
                    state.last_file_count = file_count;
                }
            }
        }
        (false, false) => {}
    }

    Ok(out)
}

fn stat(path: &Path) -> Result<Option<Metadata>, CheckError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn modified(meta: &Metadata) -> Option<SystemTime> {
    meta.modified().ok()
}

fn epoch_secs(time: Option<SystemTime>) -> i64 {
    time.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Shallow entry count of a directory.
fn entry_count(path: &Path) -> Result<usize, CheckError> {
    Ok(std::fs::read_dir(path)?.count())
}

fn sha256_file(path: &Path) -> Result<String, CheckError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
