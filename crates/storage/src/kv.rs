// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store with named TTL locks.
//!
//! The transactional primitive under the workflow state engine and the
//! fleet tooling: a durable string→string map with per-key timestamps, plus
//! a lock table of named leases with holder identity. Expired locks are
//! lazily swept on every mutating lock operation.

use crate::store::{Store, StoreError, StoreState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sloth_core::Clock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors from KV and lock operations
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("{what} must not be empty")]
    Empty { what: &'static str },
    #[error("lock '{name}' already held by {holder}")]
    AlreadyHeld { name: String, holder: String },
    #[error("lock '{name}' not held by {holder}")]
    NotHeld { name: String, holder: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One stored value with its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvEntry {
    pub value: String,
    pub created_at: DateTime<Utc>,
    /// Monotone non-decreasing per key
    pub updated_at: DateTime<Utc>,
}

/// One live (or not yet swept) lock lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRow {
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LockRow {
    /// A lock is live iff `now < expires_at`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Materialized KV state: entries plus the lock table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KvState {
    pub entries: HashMap<String, KvEntry>,
    pub locks: HashMap<String, LockRow>,
}

/// WAL ops for the KV store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum KvOp {
    Set {
        key: String,
        value: String,
        at: DateTime<Utc>,
    },
    Delete {
        key: String,
    },
    Acquire {
        name: String,
        holder: String,
        at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Release {
        name: String,
    },
    /// Garbage-collect leases with `expires_at <= at`
    Sweep {
        at: DateTime<Utc>,
    },
}

impl StoreState for KvState {
    type Op = KvOp;

    fn apply(&mut self, op: &KvOp) {
        match op {
            KvOp::Set { key, value, at } => {
                match self.entries.get_mut(key) {
                    Some(entry) => {
                        entry.value = value.clone();
                        entry.updated_at = *at;
                    }
                    None => {
                        self.entries.insert(
                            key.clone(),
                            KvEntry {
                                value: value.clone(),
                                created_at: *at,
                                updated_at: *at,
                            },
                        );
                    }
                }
            }
            KvOp::Delete { key } => {
                self.entries.remove(key);
            }
            KvOp::Acquire {
                name,
                holder,
                at,
                expires_at,
            } => {
                self.locks.insert(
                    name.clone(),
                    LockRow {
                        holder: holder.clone(),
                        acquired_at: *at,
                        expires_at: *expires_at,
                    },
                );
            }
            KvOp::Release { name } => {
                self.locks.remove(name);
            }
            KvOp::Sweep { at } => {
                self.locks.retain(|_, row| row.expires_at > *at);
            }
        }
    }
}

/// Durable KV + lock store.
///
/// Cloneable handle; all clones share one underlying store, so mutations
/// serialize on its write lock.
pub struct KvStore<C: Clock> {
    store: Arc<Store<KvState>>,
    clock: C,
}

impl<C: Clock> Clone for KvStore<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock> KvStore<C> {
    /// Open (or create) the `kv` store under `dir`.
    pub fn open(dir: &Path, clock: C) -> Result<Self, KvError> {
        Ok(Self {
            store: Arc::new(Store::open(dir, "kv")?),
            clock,
        })
    }

    /// Upsert a value. Idempotent; bumps `updated_at` on conflict.
    pub fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        if key.is_empty() {
            return Err(KvError::Empty { what: "key" });
        }
        self.store.commit(KvOp::Set {
            key: key.to_string(),
            value: value.to_string(),
            at: self.clock.now(),
        })?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<String, KvError> {
        self.store
            .read(|s| s.entries.get(key).map(|e| e.value.clone()))
            .ok_or_else(|| KvError::KeyNotFound(key.to_string()))
    }

    /// Fetch a value with its timestamps.
    pub fn entry(&self, key: &str) -> Result<KvEntry, KvError> {
        self.store
            .read(|s| s.entries.get(key).cloned())
            .ok_or_else(|| KvError::KeyNotFound(key.to_string()))
    }

    /// Remove if present; succeeds silently when the key is absent.
    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        if !self.exists(key) {
            return Ok(());
        }
        self.store.commit(KvOp::Delete {
            key: key.to_string(),
        })?;
        Ok(())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.store.read(|s| s.entries.contains_key(key))
    }

    /// All `key → value` pairs under `prefix`; an empty prefix lists all.
    pub fn list(&self, prefix: &str) -> HashMap<String, String> {
        self.store.read(|s| {
            s.entries
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, e)| (k.clone(), e.value.clone()))
                .collect()
        })
    }

    /// All entries under `prefix` with timestamps, sorted by key.
    pub fn entries(&self, prefix: &str) -> Vec<(String, KvEntry)> {
        let mut all: Vec<(String, KvEntry)> = self.store.read(|s| {
            s.entries
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect()
        });
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Read-modify-write counter. Missing or non-integer values count as 0.
    /// Returns the new value.
    pub fn increment(&self, key: &str, delta: i64) -> Result<i64, KvError> {
        if key.is_empty() {
            return Err(KvError::Empty { what: "key" });
        }
        // Serialized against other writers by the store's write path; a
        // second writer's Set lands strictly before or after ours.
        let current = self
            .store
            .read(|s| s.entries.get(key).map(|e| e.value.clone()))
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let next = current.saturating_add(delta);
        self.store.commit(KvOp::Set {
            key: key.to_string(),
            value: next.to_string(),
            at: self.clock.now(),
        })?;
        Ok(next)
    }

    /// Acquire a named lease for `ttl`.
    ///
    /// Sweeps expired leases first; fails with `AlreadyHeld` if a live lock
    /// exists under this name (even for the same holder).
    pub fn lock(&self, name: &str, holder: &str, ttl: Duration) -> Result<(), KvError> {
        if name.is_empty() {
            return Err(KvError::Empty { what: "lock name" });
        }
        if holder.is_empty() {
            return Err(KvError::Empty { what: "holder" });
        }
        self.sweep_expired()?;

        let now = self.clock.now();
        if let Some(row) = self.store.read(|s| s.locks.get(name).cloned()) {
            if row.is_live(now) {
                return Err(KvError::AlreadyHeld {
                    name: name.to_string(),
                    holder: row.holder,
                });
            }
        }

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.store.commit(KvOp::Acquire {
            name: name.to_string(),
            holder: holder.to_string(),
            at: now,
            expires_at,
        })?;
        Ok(())
    }

    /// Release a lease. Only the recorded holder may release it.
    pub fn unlock(&self, name: &str, holder: &str) -> Result<(), KvError> {
        self.sweep_expired()?;

        let row = self.store.read(|s| s.locks.get(name).cloned());
        match row {
            Some(row) if row.holder == holder => {
                self.store.commit(KvOp::Release {
                    name: name.to_string(),
                })?;
                Ok(())
            }
            _ => Err(KvError::NotHeld {
                name: name.to_string(),
                holder: holder.to_string(),
            }),
        }
    }

    /// Number of currently live leases.
    pub fn lock_count(&self) -> usize {
        let now = self.clock.now();
        self.store
            .read(|s| s.locks.values().filter(|row| row.is_live(now)).count())
    }

    /// Liveness check: `(true, holder)` for a live lease, else `(false, "")`.
    pub fn is_locked(&self, name: &str) -> (bool, String) {
        let now = self.clock.now();
        self.store.read(|s| match s.locks.get(name) {
            Some(row) if row.is_live(now) => (true, row.holder.clone()),
            _ => (false, String::new()),
        })
    }

    /// Scoped acquisition: run `f` under the lease, releasing on every exit
    /// path (including unwinds, via the guard's `Drop`). A release failure
    /// never masks `f`'s own error.
    pub fn with_lock<T, E>(
        &self,
        name: &str,
        holder: &str,
        ttl: Duration,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<KvError>,
    {
        self.lock(name, holder, ttl).map_err(E::from)?;
        let guard = LockGuard {
            kv: self.clone_dyn(),
            name: name.to_string(),
            holder: holder.to_string(),
            released: false,
        };

        let result = f();
        let released = guard.release();

        match result {
            Err(body_err) => {
                // The body's error wins; a release failure is only logged.
                if let Err(release_err) = released {
                    warn!(lock = name, error = %release_err, "lock release failed");
                }
                Err(body_err)
            }
            Ok(value) => match released {
                Ok(()) => Ok(value),
                Err(release_err) => Err(E::from(release_err)),
            },
        }
    }

    fn sweep_expired(&self) -> Result<(), KvError> {
        let now = self.clock.now();
        let has_expired = self
            .store
            .read(|s| s.locks.values().any(|row| row.expires_at <= now));
        if has_expired {
            self.store.commit(KvOp::Sweep { at: now })?;
        }
        Ok(())
    }

    /// Write a snapshot and truncate the WAL (shutdown hygiene).
    pub fn checkpoint(&self) -> Result<(), KvError> {
        self.store.checkpoint()?;
        Ok(())
    }

    fn clone_dyn(&self) -> Box<dyn LockRelease> {
        Box::new(self.clone())
    }
}

/// Internal object-safe release hook so [`LockGuard`] need not be generic
/// over the clock.
trait LockRelease: Send {
    fn release_lock(&self, name: &str, holder: &str) -> Result<(), KvError>;
}

impl<C: Clock> LockRelease for KvStore<C> {
    fn release_lock(&self, name: &str, holder: &str) -> Result<(), KvError> {
        self.unlock(name, holder)
    }
}

/// Releases its lease when dropped; `release()` surfaces the error instead.
pub struct LockGuard {
    kv: Box<dyn LockRelease>,
    name: String,
    holder: String,
    released: bool,
}

impl LockGuard {
    fn release(mut self) -> Result<(), KvError> {
        self.released = true;
        self.kv.release_lock(&self.name, &self.holder)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.kv.release_lock(&self.name, &self.holder) {
            warn!(name = %self.name, holder = %self.holder, error = %e, "lock release on drop failed");
        }
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
