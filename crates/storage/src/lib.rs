// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for sloth-runner.
//!
//! Every durable concern (workflow state, agent registry, watcher catalog,
//! key-value store) is an event-sourced store: an append-only JSONL WAL of
//! operations plus a zstd-compressed snapshot, replayed at open.

mod kv;
mod snapshot;
mod store;
mod wal;

pub use kv::{KvEntry, KvError, KvState, KvStore, LockGuard, LockRow};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use store::{Store, StoreError, StoreState};
pub use wal::{Wal, WalEntry, WalError};
