// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sloth agent`: fleet directory commands.

use super::{call, unexpected};
use crate::output::{self, confirm, format_time_ago, OutputFormat};
use crate::table::{Column, Table};
use clap::Subcommand;
use sloth_wire::{Client, Request, Response};

#[derive(Subcommand)]
pub enum AgentCmd {
    /// List registered agents with derived liveness
    List,
    /// Show one agent
    Get { name: String },
    /// Remove an agent from the registry
    Remove {
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Metrics history for one agent
    Metrics {
        name: String,
        /// Maximum samples, newest first (0 = all retained)
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Purge agents whose heartbeat is older than the cutoff
    Cleanup {
        /// Age cutoff in hours
        #[arg(long, default_value_t = 24)]
        max_hours: u64,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(client: &Client, format: OutputFormat, command: AgentCmd) -> anyhow::Result<()> {
    match command {
        AgentCmd::List => {
            let response = call(client, Request::ListAgents).await?;
            let Response::Agents { records } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&records),
                OutputFormat::Table => {
                    if records.is_empty() {
                        println!("No agents registered");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("NAME"),
                        Column::left("ADDRESS"),
                        Column::left("STATUS"),
                        Column::right("HEARTBEAT"),
                        Column::left("VERSION"),
                    ]);
                    for record in records {
                        table.row(vec![
                            record.name,
                            record.address,
                            record.status.to_string(),
                            format_time_ago(record.last_heartbeat),
                            record.version,
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        AgentCmd::Get { name } => {
            let response = call(client, Request::GetAgent { name }).await?;
            let Response::Agent { record } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&record),
                OutputFormat::Table => {
                    println!("name:       {}", record.name);
                    println!("address:    {}", record.address);
                    println!("status:     {}", record.status);
                    println!("heartbeat:  {} ago", format_time_ago(record.last_heartbeat));
                    println!("registered: {}", record.registered_at);
                    if !record.version.is_empty() {
                        println!("version:    {}", record.version);
                    }
                    if let Some(info) = &record.system_info {
                        println!("system:     {info}");
                    }
                    Ok(())
                }
            }
        }
        AgentCmd::Remove { name, force } => {
            if !confirm(&format!("Remove agent '{name}'?"), force)? {
                return Ok(());
            }
            let response = call(client, Request::UnregisterAgent { name: name.clone() }).await?;
            let Response::Ok = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => {
                    output::print_json(&serde_json::json!({"ok": format!("removed '{name}'")}))
                }
                OutputFormat::Table => {
                    println!("removed '{name}'");
                    Ok(())
                }
            }
        }
        AgentCmd::Metrics { name, limit } => {
            let response = call(client, Request::MetricsHistory { name, limit }).await?;
            let Response::Metrics { samples } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => output::print_json(&samples),
                OutputFormat::Table => {
                    if samples.is_empty() {
                        println!("No metrics recorded");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::right("WHEN"),
                        Column::right("CPU%"),
                        Column::right("MEM%"),
                        Column::right("DISK%"),
                        Column::right("LOAD1"),
                        Column::right("LOAD5"),
                        Column::right("LOAD15"),
                    ]);
                    for sample in samples {
                        table.row(vec![
                            format_time_ago(sample.timestamp),
                            format!("{:.1}", sample.cpu_percent),
                            format!("{:.1}", sample.memory_percent),
                            format!("{:.1}", sample.disk_percent),
                            format!("{:.2}", sample.load_1),
                            format!("{:.2}", sample.load_5),
                            format!("{:.2}", sample.load_15),
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        AgentCmd::Cleanup { max_hours, force } => {
            if !confirm(
                &format!("Remove agents silent for more than {max_hours}h?"),
                force,
            )? {
                return Ok(());
            }
            let response = call(client, Request::CleanupInactiveAgents { max_hours }).await?;
            let Response::Removed { count } = response else {
                return unexpected();
            };
            match format {
                OutputFormat::Json => {
                    output::print_json(&serde_json::json!({"removed": count}))
                }
                OutputFormat::Table => {
                    println!("removed {count} agents");
                    Ok(())
                }
            }
        }
    }
}
