// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log watcher: tail-append pattern matching.
//!
//! The first check baselines at end-of-file so pre-existing content is not
//! replayed; truncation (rotation) resets the position to zero.

use super::{CheckError, Emission, WatcherState};
use crate::pattern;
use serde_json::json;
use sloth_core::{EventCondition, WatcherConfig};
use std::path::Path;

pub(super) fn check_log(
    config: &WatcherConfig,
    state: &mut WatcherState,
) -> Result<Vec<Emission>, CheckError> {
    let path = Path::new(&config.file_path);
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            state.last_position = 0;
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let len = content.len() as u64;
    if len < state.last_position {
        state.last_position = 0;
    }

    let mut out = Vec::new();
    let fire = config.has_condition(EventCondition::Matches)
        || config.has_condition(EventCondition::Contains);

    if state.initialized && fire {
        let new_content = &content[state.last_position as usize..];
        for line in new_content.lines() {
            if pattern::matches(&config.pattern, line) {
                out.push(Emission::new(
                    "log.pattern_matched",
                    json!({
                        "path": config.file_path,
                        "pattern": config.pattern,
                        "line": line,
                    }),
                ));
            }
        }
    }

    state.last_position = len;
    Ok(out)
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
