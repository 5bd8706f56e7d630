// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sloth events`: recent events ingested by the master.

use super::{call, unexpected};
use crate::output::{self, OutputFormat};
use crate::table::{Column, Table};
use chrono::{TimeZone, Utc};
use clap::Args;
use sloth_wire::{Client, Request, Response};

#[derive(Args)]
pub struct EventsArgs {
    /// Filter by stack label
    #[arg(long)]
    pub stack: Option<String>,

    /// Filter by run id label
    #[arg(long)]
    pub run_id: Option<String>,

    /// Maximum events, newest first (0 = all retained)
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

pub async fn run(client: &Client, format: OutputFormat, args: EventsArgs) -> anyhow::Result<()> {
    let response = call(client, Request::RecentEvents {
        stack: args.stack,
        run_id: args.run_id,
        limit: args.limit,
    })
    .await?;
    let Response::Events { events } = response else {
        return unexpected();
    };

    match format {
        OutputFormat::Json => output::print_json(&events),
        OutputFormat::Table => {
            if events.is_empty() {
                println!("No events");
                return Ok(());
            }
            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::right("WHEN"),
                Column::left("SEVERITY"),
                Column::left("TYPE"),
                Column::left("AGENT"),
                Column::left("STACK"),
                Column::left("DATA").with_max(60),
            ]);
            for event in events {
                let when = Utc
                    .timestamp_opt(event.timestamp, 0)
                    .single()
                    .map(output::format_time_ago)
                    .unwrap_or_else(|| "-".to_string());
                table.row(vec![
                    event.event_id.short(8).to_string(),
                    when,
                    event.severity.to_string(),
                    event.event_type,
                    event.agent_name,
                    event.stack,
                    event.data,
                ]);
            }
            table.render(&mut std::io::stdout());
            Ok(())
        }
    }
}
