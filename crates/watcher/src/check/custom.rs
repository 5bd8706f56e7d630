// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom watcher: a caller-supplied predicate behind a narrow trait.
//!
//! This is the single seam for scripting hosts: the embedding layer adapts
//! its callback to [`CustomCheck`] and registers it with the manager.

use super::Emission;
use sloth_core::WatcherConfig;

/// Caller-supplied predicate for `custom` watchers.
pub trait CustomCheck: Send + Sync {
    /// Returns whether the watcher triggered, plus a payload to merge into
    /// the emitted event.
    fn check(&self) -> (bool, serde_json::Value);
}

impl<F> CustomCheck for F
where
    F: Fn() -> (bool, serde_json::Value) + Send + Sync,
{
    fn check(&self) -> (bool, serde_json::Value) {
        self()
    }
}

pub(super) fn check_custom(
    config: &WatcherConfig,
    custom: Option<&dyn CustomCheck>,
) -> Vec<Emission> {
    let Some(custom) = custom else {
        // Registered from a persisted config with no live predicate bound
        return Vec::new();
    };

    let (triggered, data) = custom.check();
    if !triggered {
        return Vec::new();
    }

    let mut map = data.as_object().cloned().unwrap_or_default();
    map.insert(
        "watcher_id".to_string(),
        serde_json::Value::String(config.id.to_string()),
    );
    vec![Emission::new(
        "custom.triggered",
        serde_json::Value::Object(map),
    )]
}
