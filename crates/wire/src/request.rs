// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response shapes for the RPC protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sloth_core::{
    AgentRecord, DriftDetection, Event, MetricsSample, Resource, SearchQuery, StateAnalytics,
    StateDiff, StateVersion, WorkflowState, WorkflowStateExport,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// A task shipped from the master to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Shell command line to execute
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_id: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    /// 0 means the agent-side default
    #[serde(default)]
    pub timeout_secs: u64,
}

/// One KV entry as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvItem {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Requests against the raw keyed state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KvRequest {
    List { prefix: String },
    Get { key: String },
    Set { key: String, value: String },
    Delete { key: String },
    /// Delete every key under the prefix (empty prefix clears all)
    Clear { prefix: String },
    Stats,
}

/// Requests against the workflow state engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateRequest {
    List {
        name: Option<String>,
        status: Option<String>,
    },
    Get {
        id: String,
    },
    GetByName {
        name: String,
    },
    Create {
        state: WorkflowState,
    },
    /// Persist a row mutation; the engine bumps the version and snapshots
    Update {
        state: WorkflowState,
        #[serde(default)]
        description: String,
    },
    Delete {
        id: String,
    },
    Resources {
        id: String,
    },
    Outputs {
        id: String,
    },
    Versions {
        id: String,
    },
    Rollback {
        id: String,
        version: u32,
    },
    Drift {
        id: String,
    },
    DetectDrift {
        id: String,
        resource_id: String,
        expected: serde_json::Value,
        actual: serde_json::Value,
    },
    Diff {
        id: String,
        from_version: u32,
        to_version: u32,
    },
    Export {
        id: String,
    },
    Import {
        export: Box<WorkflowStateExport>,
        overwrite: bool,
    },
    /// Master-side backup into a master-local directory
    Backup {
        id: String,
        dir: PathBuf,
    },
    Restore {
        artifact: PathBuf,
        overwrite: bool,
    },
    Search {
        query: SearchQuery,
    },
    Prune {
        older_than_secs: u64,
        keep_successful: bool,
    },
    Analytics,
    TagAdd {
        id: String,
        tag: String,
    },
    TagRemove {
        id: String,
        tag: String,
    },
    Tags {
        id: String,
    },
}

/// Request from a client (CLI or agent) to a listener (master or agent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    // -- agent control plane (handled by the master) --
    RegisterAgent {
        name: String,
        address: String,
    },
    Heartbeat {
        name: String,
    },
    UpdateSystemInfo {
        name: String,
        info: serde_json::Value,
    },
    UpdateAgentVersion {
        name: String,
        version: String,
    },
    UnregisterAgent {
        name: String,
    },
    SaveMetrics {
        name: String,
        cpu_percent: f64,
        memory_percent: f64,
        disk_percent: f64,
        load_1: f64,
        load_5: f64,
        load_15: f64,
    },
    ListAgents,
    GetAgent {
        name: String,
    },
    MetricsHistory {
        name: String,
        limit: usize,
    },
    CleanupInactiveAgents {
        max_hours: u64,
    },

    // -- event ingest (handled by the master) --
    SendEventBatch {
        events: Vec<Event>,
        batch_size: u32,
    },
    /// Recent ingested events, optionally filtered by correlation labels
    RecentEvents {
        stack: Option<String>,
        run_id: Option<String>,
        limit: usize,
    },

    // -- task dispatch --
    /// Resolve the agent via the registry and forward the task
    DispatchTask {
        agent: String,
        payload: TaskPayload,
    },
    /// Execute a task (handled by the agent's own listener)
    RunTask {
        payload: TaskPayload,
    },

    // -- stores --
    State {
        request: StateRequest,
    },
    Kv {
        request: KvRequest,
    },

    /// Request daemon shutdown
    Shutdown,
}

/// Response to a [`Request`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Pong,
    Hello {
        version: String,
    },
    /// Any failed request; `message` is the surfaced error
    Error {
        message: String,
    },
    Agent {
        record: Box<AgentRecord>,
    },
    Agents {
        records: Vec<AgentRecord>,
    },
    Metrics {
        samples: Vec<MetricsSample>,
    },
    /// Result of cleanup/prune style requests
    Removed {
        count: u64,
    },
    EventBatch {
        success: bool,
        events_processed: u32,
        failed_event_ids: Vec<String>,
        message: String,
    },
    Events {
        events: Vec<Event>,
    },
    TaskResult {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    Workflow {
        state: Box<WorkflowState>,
    },
    Workflows {
        states: Vec<WorkflowState>,
    },
    Resources {
        resources: Vec<Resource>,
    },
    Outputs {
        outputs: HashMap<String, String>,
    },
    Versions {
        versions: Vec<StateVersion>,
    },
    /// New version number after a persisting mutation
    Version {
        version: u32,
    },
    Drifts {
        drifts: Vec<DriftDetection>,
    },
    DriftResult {
        drift: Box<DriftDetection>,
    },
    Diff {
        diff: Box<StateDiff>,
    },
    Export {
        export: Box<WorkflowStateExport>,
    },
    /// Path of a written backup artifact
    Artifact {
        path: PathBuf,
    },
    /// Id of a restored workflow
    WorkflowId {
        id: String,
    },
    Analytics {
        analytics: Box<StateAnalytics>,
    },
    Tags {
        tags: Vec<String>,
    },
    KvItems {
        items: Vec<KvItem>,
    },
    KvValue {
        item: Box<KvItem>,
    },
    KvStats {
        keys: u64,
        locks: u64,
    },
    ShuttingDown,
}

impl Response {
    /// Wrap any error type into the wire error shape.
    pub fn error(err: impl std::fmt::Display) -> Self {
        Response::Error {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
