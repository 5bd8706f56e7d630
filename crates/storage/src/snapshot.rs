// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compressed snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete materialized state of one store at a
//! point in time, identified by the WAL sequence number. Recovery loads the
//! snapshot and replays WAL entries after that sequence. Snapshots are
//! zstd-compressed JSON, written atomically: tmp file, fsync, rename, then
//! directory fsync; the WAL may only be truncated after all four steps.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Current snapshot format version. Older snapshots are accepted as-is;
/// snapshots from a newer build are refused rather than misread.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// zstd level 3 is a good balance of speed and compression
const COMPRESSION_LEVEL: i32 = 3;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
    #[error("snapshot format version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// A snapshot of one store's materialized state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<S> {
    /// Snapshot format version
    pub version: u32,
    /// WAL sequence number at the time of snapshot
    pub seq: u64,
    /// The complete materialized state
    pub state: S,
    /// When this snapshot was created
    pub created_at: DateTime<Utc>,
}

impl<S: Serialize + DeserializeOwned> Snapshot<S> {
    pub fn new(seq: u64, state: S) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state,
            created_at: Utc::now(),
        }
    }

    /// Save the snapshot durably.
    ///
    /// Write ordering: serialize + compress → tmp file → fsync tmp →
    /// atomic rename → fsync directory. A crash at any point leaves either
    /// the old snapshot or the new one, never a torn file.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json_bytes = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json_bytes.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| SnapshotError::Compress(e.to_string()))?;

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;

        if let Some(parent) = path.parent() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }

        Ok(())
    }

    /// Load a snapshot if one exists.
    ///
    /// Returns `Ok(None)` if the file doesn't exist or is corrupt. Corrupt
    /// snapshots are rotated to a `.bak` file so the store can recover via
    /// WAL replay. A snapshot with an unknown future format version is an
    /// error; silently misreading it would lose data.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        let parsed: Result<serde_json::Value, String> = zstd::stream::read::Decoder::new(file)
            .map_err(|e| e.to_string())
            .and_then(|decoder| serde_json::from_reader(decoder).map_err(|e| e.to_string()));

        let value = match parsed {
            Ok(value) => value,
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "corrupt snapshot, moving to .bak and recovering from WAL",
                );
                fs::rename(path, &bak_path)?;
                return Ok(None);
            }
        };

        let found = value
            .get("version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        if found > CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found,
                supported: CURRENT_SNAPSHOT_VERSION,
            });
        }

        match serde_json::from_value(value) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "unreadable snapshot state, moving to .bak and recovering from WAL",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
