// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replayed store: WAL + snapshot + materialized state behind one lock.
//!
//! `commit()` is the transaction point: the op is appended to the WAL,
//! fsynced, and only then applied to the in-memory state. On crash either
//! the op is durable (and will be replayed) or it never happened; state
//! and log cannot diverge.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::wal::{Wal, WalError};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Auto-checkpoint after this many committed ops.
const CHECKPOINT_EVERY: u64 = 512;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Materialized state replayed from a WAL of ops.
///
/// Appliers MUST be idempotent and infallible: an op that no longer makes
/// sense against the current state (e.g. a delete for a missing key) is a
/// no-op, never an error. Ops are validated before they are committed.
pub trait StoreState: Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Op: Serialize + DeserializeOwned + Send + Sync;

    fn apply(&mut self, op: &Self::Op);
}

struct Inner<S: StoreState> {
    state: S,
    wal: Wal<S::Op>,
    snapshot_path: PathBuf,
    /// Sequence covered by the last durable snapshot
    checkpoint_seq: u64,
}

/// A durable store for one concern.
///
/// Concurrent readers share the lock; all mutations serialize on it, which
/// is the single-process serializability the platform relies on.
pub struct Store<S: StoreState> {
    inner: RwLock<Inner<S>>,
}

impl<S: StoreState> Store<S> {
    /// Open (or create) the store named `name` under `dir`.
    ///
    /// Layout: `<dir>/<name>.db` is the snapshot, `<dir>/<name>.wal` the
    /// log. Loads the snapshot if present, then replays newer WAL entries.
    pub fn open(dir: &Path, name: &str) -> Result<Self, StoreError> {
        Self::open_at(
            &dir.join(format!("{name}.db")),
            &dir.join(format!("{name}.wal")),
        )
    }

    /// Open with explicit snapshot and WAL paths.
    pub fn open_at(snapshot_path: &Path, wal_path: &Path) -> Result<Self, StoreError> {
        let (mut state, base_seq) = match Snapshot::<S>::load(snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (S::default(), 0),
        };

        let wal = Wal::open(wal_path)?;
        let mut replayed = 0u64;
        for entry in wal.entries_after(base_seq)? {
            state.apply(&entry.op);
            replayed += 1;
        }

        if replayed > 0 {
            debug!(
                path = %wal_path.display(),
                snapshot_seq = base_seq,
                replayed,
                "recovered store from snapshot + WAL replay",
            );
        }

        Ok(Self {
            inner: RwLock::new(Inner {
                state,
                wal,
                snapshot_path: snapshot_path.to_owned(),
                checkpoint_seq: base_seq,
            }),
        })
    }

    /// Run a read against the materialized state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.read().state)
    }

    /// Durably commit one op and apply it.
    pub fn commit(&self, op: S::Op) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.wal.append(&op)?;
        inner.wal.flush()?;
        inner.state.apply(&op);
        self.maybe_checkpoint(&mut inner);
        Ok(())
    }

    /// Durably commit a batch of ops with a single fsync.
    pub fn commit_all(&self, ops: Vec<S::Op>) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.write();
        for op in &ops {
            inner.wal.append(op)?;
        }
        inner.wal.flush()?;
        for op in &ops {
            inner.state.apply(op);
        }
        self.maybe_checkpoint(&mut inner);
        Ok(())
    }

    /// Snapshot the current state and truncate the WAL.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        Self::checkpoint_inner(&mut inner)
    }

    fn checkpoint_inner(inner: &mut Inner<S>) -> Result<(), StoreError> {
        let seq = inner.wal.write_seq();
        if seq == inner.checkpoint_seq {
            return Ok(());
        }

        inner.wal.flush()?;
        Snapshot::new(seq, inner.state.clone()).save(&inner.snapshot_path)?;
        // Snapshot is durable (incl. directory fsync); safe to truncate
        inner.wal.truncate_before(seq + 1)?;
        inner.checkpoint_seq = seq;

        debug!(
            path = %inner.snapshot_path.display(),
            seq,
            "checkpoint complete",
        );
        Ok(())
    }

    /// Checkpoint when enough ops have accumulated. Best-effort: a failed
    /// background checkpoint leaves the WAL intact and recovery correct.
    fn maybe_checkpoint(&self, inner: &mut Inner<S>) {
        if inner.wal.write_seq() - inner.checkpoint_seq < CHECKPOINT_EVERY {
            return;
        }
        if let Err(e) = Self::checkpoint_inner(inner) {
            warn!(error = %e, "auto-checkpoint failed, WAL retained");
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
