// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named master endpoints known to the CLI and agents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A known master endpoint. At most one record is the default; the first
/// record ever inserted is promoted automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MasterRecord {
    pub fn new(name: impl Into<String>, address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            description: String::new(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }
}
