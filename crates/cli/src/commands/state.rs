// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sloth state`: the keyed store and the workflow state surface.

use super::{call, unexpected};
use crate::output::{self, confirm, format_time_ago, OutputFormat};
use crate::table::{Column, Table};
use clap::Subcommand;
use sloth_core::{SearchQuery, ShortId, WorkflowState};
use sloth_wire::{Client, KvRequest, Request, Response, StateRequest};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum StateCmd {
    /// List keys in the state store
    List {
        /// Key prefix to filter on
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Show one key with its timestamps
    Show { key: String },
    /// Delete one key
    Delete {
        key: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Delete every key under a prefix (empty prefix clears all)
    Clear {
        #[arg(default_value = "")]
        prefix: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Store statistics
    Stats,
    /// Workflow state operations
    Workflow {
        #[command(subcommand)]
        command: WorkflowCmd,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCmd {
    /// List workflows
    List {
        /// Filter by workflow name
        #[arg(long)]
        name: Option<String>,
        /// Filter by status (pending|running|success|failed|rolled_back)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one workflow
    Show { id: String },
    /// List version snapshots
    Versions { id: String },
    /// Roll back to a previous version
    Rollback {
        id: String,
        version: u32,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// List drift detections
    Drift { id: String },
    /// List resources
    Resources { id: String },
    /// List outputs
    Outputs { id: String },
    /// Delete a workflow (cascades resources, versions, drift, tags)
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Import a workflow from an export file
    Import {
        file: PathBuf,
        /// Replace the workflow if it already exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Export a workflow to a file (stdout with `-`)
    Export {
        id: String,
        #[arg(default_value = "-")]
        file: PathBuf,
    },
    /// Write a compressed backup into a master-local directory
    Backup { id: String, dir: PathBuf },
    /// Restore a backup artifact (master-local path)
    Restore {
        artifact: PathBuf,
        /// Replace the workflow if it already exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Diff two versions
    Diff {
        id: String,
        from_version: u32,
        to_version: u32,
    },
    /// Search workflows
    Search {
        /// Substring of the workflow name
        #[arg(long)]
        name: Option<String>,
        /// Required resource type
        #[arg(long)]
        resource_type: Option<String>,
        /// Only workflows with (or without) errors
        #[arg(long)]
        has_errors: Option<bool>,
        /// Maximum results (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Delete workflows older than a cutoff
    Prune {
        /// Age cutoff in hours
        #[arg(long, default_value_t = 24 * 30)]
        older_than_hours: u64,
        /// Retain successful workflows
        #[arg(long)]
        keep_successful: bool,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Aggregated statistics over all workflows
    Analytics,
    /// Workflow tags
    Tags {
        #[command(subcommand)]
        command: TagsCmd,
    },
}

#[derive(Subcommand)]
pub enum TagsCmd {
    Add { id: String, tag: String },
    Remove { id: String, tag: String },
    List { id: String },
}

pub async fn run(client: &Client, format: OutputFormat, command: StateCmd) -> anyhow::Result<()> {
    match command {
        StateCmd::List { prefix } => {
            let response = call(client, Request::Kv {
                request: KvRequest::List { prefix },
            })
            .await?;
            let Response::KvItems { items } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&items),
                OutputFormat::Table => {
                    if items.is_empty() {
                        println!("No keys found");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("KEY"),
                        Column::right("UPDATED"),
                        Column::left("VALUE").with_max(60),
                    ]);
                    for item in items {
                        table.row(vec![
                            item.key,
                            format_time_ago(item.updated_at),
                            item.value,
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        StateCmd::Show { key } => {
            let response = call(client, Request::Kv {
                request: KvRequest::Get { key },
            })
            .await?;
            let Response::KvValue { item } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&item),
                OutputFormat::Table => {
                    println!("key:        {}", item.key);
                    println!("value:      {}", item.value);
                    println!("created_at: {}", item.created_at);
                    println!("updated_at: {}", item.updated_at);
                    Ok(())
                }
            }
        }
        StateCmd::Delete { key, force } => {
            if !confirm(&format!("Delete key '{key}'?"), force)? {
                return Ok(());
            }
            let response = call(client, Request::Kv {
                request: KvRequest::Delete { key: key.clone() },
            })
            .await?;
            let Response::Ok = response else {
                return unexpected();
            };
            done(format, &format!("deleted '{key}'"))
        }
        StateCmd::Clear { prefix, force } => {
            let scope = if prefix.is_empty() {
                "ALL keys".to_string()
            } else {
                format!("keys under '{prefix}'")
            };
            if !confirm(&format!("Delete {scope}?"), force)? {
                return Ok(());
            }
            let response = call(client, Request::Kv {
                request: KvRequest::Clear { prefix },
            })
            .await?;
            let Response::Removed { count } = response else {
                return unexpected();
            };
            done(format, &format!("removed {count} keys"))
        }
        StateCmd::Stats => {
            let response = call(client, Request::Kv {
                request: KvRequest::Stats,
            })
            .await?;
            let Response::KvStats { keys, locks } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => {
                    output::print_json(&serde_json::json!({"keys": keys, "locks": locks}))
                }
                OutputFormat::Table => {
                    println!("keys:  {keys}");
                    println!("locks: {locks}");
                    Ok(())
                }
            }
        }
        StateCmd::Workflow { command } => workflow(client, format, command).await,
    }
}

async fn workflow(
    client: &Client,
    format: OutputFormat,
    command: WorkflowCmd,
) -> anyhow::Result<()> {
    match command {
        WorkflowCmd::List { name, status } => {
            let response = call(client, Request::State {
                request: StateRequest::List { name, status },
            })
            .await?;
            let Response::Workflows { states } = response else {
                return unexpected();
            };
            render_workflow_list(format, states)
        }
        WorkflowCmd::Show { id } => {
            let response = call(client, Request::State {
                request: StateRequest::Get { id },
            })
            .await?;
            let Response::Workflow { state } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&state),
                OutputFormat::Table => {
                    render_workflow(&state);
                    Ok(())
                }
            }
        }
        WorkflowCmd::Versions { id } => {
            let response = call(client, Request::State {
                request: StateRequest::Versions { id },
            })
            .await?;
            let Response::Versions { versions } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&versions),
                OutputFormat::Table => {
                    if versions.is_empty() {
                        println!("No versions found");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::right("VERSION"),
                        Column::right("CREATED"),
                        Column::left("BY"),
                        Column::left("DESCRIPTION"),
                    ]);
                    for version in versions {
                        table.row(vec![
                            version.version.to_string(),
                            format_time_ago(version.created_at),
                            version.created_by,
                            version.description,
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        WorkflowCmd::Rollback { id, version, force } => {
            if !confirm(
                &format!("Roll back workflow '{id}' to version {version}?"),
                force,
            )? {
                return Ok(());
            }
            let response = call(client, Request::State {
                request: StateRequest::Rollback {
                    id: id.clone(),
                    version,
                },
            })
            .await?;
            let Response::Version {
                version: new_version,
            } = response
            else {
                return unexpected();
            };
            done(
                format,
                &format!("workflow '{id}' rolled back to version {version} (now v{new_version})"),
            )
        }
        WorkflowCmd::Drift { id } => {
            let response = call(client, Request::State {
                request: StateRequest::Drift { id },
            })
            .await?;
            let Response::Drifts { drifts } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&drifts),
                OutputFormat::Table => {
                    if drifts.is_empty() {
                        println!("No drift detections");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("ID"),
                        Column::left("RESOURCE"),
                        Column::left("TYPE"),
                        Column::left("DRIFTED"),
                        Column::right("DETECTED"),
                    ]);
                    for drift in drifts {
                        table.row(vec![
                            drift.id.short(8).to_string(),
                            drift.resource_id,
                            drift.resource_type,
                            drift.drifted.to_string(),
                            format_time_ago(drift.detected_at),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        WorkflowCmd::Resources { id } => {
            let response = call(client, Request::State {
                request: StateRequest::Resources { id },
            })
            .await?;
            let Response::Resources { resources } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&resources),
                OutputFormat::Table => {
                    if resources.is_empty() {
                        println!("No resources");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("ID"),
                        Column::left("TYPE"),
                        Column::left("NAME"),
                        Column::left("ACTION"),
                        Column::left("STATUS"),
                    ]);
                    for resource in resources {
                        table.row(vec![
                            resource.id,
                            resource.resource_type,
                            resource.name,
                            resource.action.to_string(),
                            resource.status,
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        WorkflowCmd::Outputs { id } => {
            let response = call(client, Request::State {
                request: StateRequest::Outputs { id },
            })
            .await?;
            let Response::Outputs { outputs } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&outputs),
                OutputFormat::Table => {
                    let mut keys: Vec<&String> = outputs.keys().collect();
                    keys.sort();
                    for key in keys {
                        println!("{key} = {}", outputs[key]);
                    }
                    Ok(())
                }
            }
        }
        WorkflowCmd::Delete { id, force } => {
            if !confirm(&format!("Delete workflow '{id}' and all its history?"), force)? {
                return Ok(());
            }
            let response = call(client, Request::State {
                request: StateRequest::Delete { id: id.clone() },
            })
            .await?;
            let Response::Ok = response else {
                return unexpected();
            };
            done(format, &format!("deleted workflow '{id}'"))
        }
        WorkflowCmd::Import { file, overwrite } => {
            let content = std::fs::read_to_string(&file)?;
            let export = serde_json::from_str(&content)?;
            let response = call(client, Request::State {
                request: StateRequest::Import {
                    export: Box::new(export),
                    overwrite,
                },
            })
            .await?;
            let Response::Ok = response else {
                return unexpected();
            };
            done(format, &format!("imported from {}", file.display()))
        }
        WorkflowCmd::Export { id, file } => {
            let response = call(client, Request::State {
                request: StateRequest::Export { id },
            })
            .await?;
            let Response::Export { export } = response else {
                return unexpected();
            };
            let json = serde_json::to_string_pretty(&export)?;
            if file.as_os_str() == "-" {
                println!("{json}");
                Ok(())
            } else {
                std::fs::write(&file, json)?;
                done(format, &format!("exported to {}", file.display()))
            }
        }
        WorkflowCmd::Backup { id, dir } => {
            let response = call(client, Request::State {
                request: StateRequest::Backup { id, dir },
            })
            .await?;
            let Response::Artifact { path } = response else {
                return unexpected();
            };
            done(format, &format!("backup written to {}", path.display()))
        }
        WorkflowCmd::Restore {
            artifact,
            overwrite,
        } => {
            let response = call(client, Request::State {
                request: StateRequest::Restore {
                    artifact,
                    overwrite,
                },
            })
            .await?;
            let Response::WorkflowId { id } = response else {
                return unexpected();
            };
            done(format, &format!("restored workflow '{id}'"))
        }
        WorkflowCmd::Diff {
            id,
            from_version,
            to_version,
        } => {
            let response = call(client, Request::State {
                request: StateRequest::Diff {
                    id,
                    from_version,
                    to_version,
                },
            })
            .await?;
            let Response::Diff { diff } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&diff),
                OutputFormat::Table => {
                    if diff.is_empty() {
                        println!("No differences between v{from_version} and v{to_version}");
                        return Ok(());
                    }
                    if !diff.status_change.is_empty() {
                        println!("status: {}", diff.status_change);
                    }
                    for added in &diff.added_resources {
                        println!("+ {}/{}", added.resource_type, added.name);
                    }
                    for removed in &diff.removed_resources {
                        println!("- {}/{}", removed.resource_type, removed.name);
                    }
                    for modified in &diff.modified_resources {
                        println!("~ {}/{}", modified.resource_type, modified.name);
                        println!("    before: {}", modified.before);
                        println!("    after:  {}", modified.after);
                    }
                    Ok(())
                }
            }
        }
        WorkflowCmd::Search {
            name,
            resource_type,
            has_errors,
            limit,
        } => {
            let response = call(client, Request::State {
                request: StateRequest::Search {
                    query: SearchQuery {
                        name,
                        resource_type,
                        has_errors,
                        limit,
                    },
                },
            })
            .await?;
            let Response::Workflows { states } = response else {
                return unexpected();
            };
            render_workflow_list(format, states)
        }
        WorkflowCmd::Prune {
            older_than_hours,
            keep_successful,
            force,
        } => {
            if !confirm(
                &format!("Prune workflows older than {older_than_hours}h?"),
                force,
            )? {
                return Ok(());
            }
            let response = call(client, Request::State {
                request: StateRequest::Prune {
                    older_than_secs: older_than_hours * 3600,
                    keep_successful,
                },
            })
            .await?;
            let Response::Removed { count } = response else {
                return unexpected();
            };
            done(format, &format!("pruned {count} workflows"))
        }
        WorkflowCmd::Analytics => {
            let response = call(client, Request::State {
                request: StateRequest::Analytics,
            })
            .await?;
            let Response::Analytics { analytics } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&analytics),
                OutputFormat::Table => {
                    println!("workflows:        {}", analytics.total_workflows);
                    println!(
                        "success rate:     {:.1}%",
                        analytics.success_rate * 100.0
                    );
                    println!(
                        "avg duration:     {:.1}s",
                        analytics.average_duration_secs
                    );
                    let mut statuses: Vec<_> =
                        analytics.status_distribution.iter().collect();
                    statuses.sort();
                    for (status, count) in statuses {
                        println!("  {status}: {count}");
                    }
                    if !analytics.top_workflows.is_empty() {
                        println!("top workflows:");
                        for top in &analytics.top_workflows {
                            println!("  {} ({} runs)", top.name, top.executions);
                        }
                    }
                    Ok(())
                }
            }
        }
        WorkflowCmd::Tags { command } => tags(client, format, command).await,
    }
}

async fn tags(client: &Client, format: OutputFormat, command: TagsCmd) -> anyhow::Result<()> {
    match command {
        TagsCmd::Add { id, tag } => {
            let response = call(client, Request::State {
                request: StateRequest::TagAdd {
                    id: id.clone(),
                    tag: tag.clone(),
                },
            })
            .await?;
            let Response::Ok = response else {
                return unexpected();
            };
            done(format, &format!("tagged '{id}' with '{tag}'"))
        }
        TagsCmd::Remove { id, tag } => {
            let response = call(client, Request::State {
                request: StateRequest::TagRemove {
                    id: id.clone(),
                    tag,
                },
            })
            .await?;
            let Response::Ok = response else {
                return unexpected();
            };
            done(format, &format!("untagged '{id}'"))
        }
        TagsCmd::List { id } => {
            let response = call(client, Request::State {
                request: StateRequest::Tags { id },
            })
            .await?;
            let Response::Tags { tags } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&tags),
                OutputFormat::Table => {
                    for tag in tags {
                        println!("{tag}");
                    }
                    Ok(())
                }
            }
        }
    }
}

fn render_workflow_list(format: OutputFormat, states: Vec<WorkflowState>) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&states),
        OutputFormat::Table => {
            if states.is_empty() {
                println!("No workflows found");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::left("NAME"),
                Column::right("VERSION"),
                Column::left("STATUS"),
                Column::right("STARTED"),
                Column::right("RESOURCES"),
            ]);
            for state in states {
                table.row(vec![
                    state.id,
                    state.name,
                    state.version.to_string(),
                    state.status.to_string(),
                    format_time_ago(state.started_at),
                    state.resources.len().to_string(),
                ]);
            }
            table.render(&mut std::io::stdout());
            Ok(())
        }
    }
}

fn render_workflow(state: &WorkflowState) {
    println!("id:        {}", state.id);
    println!("name:      {}", state.name);
    println!("version:   {}", state.version);
    println!("status:    {}", state.status);
    println!("started:   {}", state.started_at);
    if let Some(completed_at) = state.completed_at {
        println!("completed: {completed_at} ({}s)", state.duration_secs);
    }
    if !state.error_msg.is_empty() {
        println!("error:     {}", state.error_msg);
    }
    if !state.locked_by.is_empty() {
        println!("locked by: {}", state.locked_by);
    }
    if !state.metadata.is_empty() {
        println!("metadata:");
        let mut keys: Vec<&String> = state.metadata.keys().collect();
        keys.sort();
        for key in keys {
            println!("  {key} = {}", state.metadata[key]);
        }
    }
    println!("resources: {}", state.resources.len());
    for resource in &state.resources {
        println!(
            "  {} {}/{} ({})",
            resource.action, resource.resource_type, resource.name, resource.id
        );
    }
    if !state.outputs.is_empty() {
        println!("outputs:");
        let mut keys: Vec<&String> = state.outputs.keys().collect();
        keys.sort();
        for key in keys {
            println!("  {key} = {}", state.outputs[key]);
        }
    }
}

fn done(format: OutputFormat, message: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({"ok": message})),
        OutputFormat::Table => {
            println!("{message}");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
