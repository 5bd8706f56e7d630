// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event ingest: idempotent batch intake with a bounded recent-event ring.
//!
//! Delivery from agents is at-least-once, so the sink deduplicates on
//! `event_id` over a bounded insertion-ordered window. Nothing here is
//! persisted; the control plane's own state is reconstructible.

use parking_lot::Mutex;
use sloth_core::Event;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Size of the event-id dedupe window.
const DEDUPE_WINDOW: usize = 8192;
/// Recent events retained for queries.
const RECENT_LIMIT: usize = 1024;

/// Outcome of one ingested batch, in wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub success: bool,
    pub events_processed: u32,
    pub failed_event_ids: Vec<String>,
    pub message: String,
}

#[derive(Default)]
struct IngestState {
    seen: HashSet<String>,
    seen_order: VecDeque<String>,
    recent: VecDeque<Event>,
}

/// The master-side event sink.
#[derive(Default)]
pub struct EventIngest {
    state: Mutex<IngestState>,
}

impl EventIngest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one batch. Duplicates (already-seen ids) count as processed;
    /// events missing an id, type, or agent are rejected by id.
    pub fn handle_batch(&self, events: Vec<Event>) -> IngestOutcome {
        let mut state = self.state.lock();
        let mut processed = 0u32;
        let mut failed_event_ids = Vec::new();

        for event in events {
            if event.event_id.as_str().is_empty()
                || event.event_type.is_empty()
                || event.agent_name.is_empty()
            {
                failed_event_ids.push(event.event_id.to_string());
                continue;
            }

            if state.seen.contains(event.event_id.as_str()) {
                // Idempotent redelivery
                processed += 1;
                continue;
            }

            state.seen.insert(event.event_id.to_string());
            state.seen_order.push_back(event.event_id.to_string());
            while state.seen_order.len() > DEDUPE_WINDOW {
                if let Some(evicted) = state.seen_order.pop_front() {
                    state.seen.remove(&evicted);
                }
            }

            debug!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                agent = %event.agent_name,
                stack = %event.stack,
                severity = %event.severity,
                "event ingested",
            );

            state.recent.push_back(event);
            while state.recent.len() > RECENT_LIMIT {
                state.recent.pop_front();
            }
            processed += 1;
        }

        let success = failed_event_ids.is_empty();
        IngestOutcome {
            success,
            events_processed: processed,
            message: if success {
                String::new()
            } else {
                format!("{} events rejected", failed_event_ids.len())
            },
            failed_event_ids,
        }
    }

    /// Recent events, newest first, filtered by correlation labels when
    /// present. `limit` of 0 means all retained.
    pub fn recent(&self, stack: Option<&str>, run_id: Option<&str>, limit: usize) -> Vec<Event> {
        let state = self.state.lock();
        let mut events: Vec<Event> = state
            .recent
            .iter()
            .rev()
            .filter(|e| stack.is_none_or(|s| e.stack == s))
            .filter(|e| run_id.is_none_or(|r| e.run_id == r))
            .cloned()
            .collect();
        if limit > 0 {
            events.truncate(limit);
        }
        events
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
