// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specifications for the sloth-runner core.
//!
//! These suites exercise the component crates end-to-end: an in-process
//! master served over TCP where the scenario crosses the wire, and the
//! stores directly where the scenario is about their semantics.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/create_update_rollback.rs"]
mod create_update_rollback;

#[path = "specs/lock_contention.rs"]
mod lock_contention;

#[path = "specs/event_batching.rs"]
mod event_batching;

#[path = "specs/file_watcher.rs"]
mod file_watcher;

#[path = "specs/drift.rs"]
mod drift;

#[path = "specs/agent_liveness.rs"]
mod agent_liveness;

#[path = "specs/round_trips.rs"]
mod round_trips;
