// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sloth master`: locally stored master endpoints.
//!
//! Master records live in the CLI's own data directory (`masters.db`), not
//! on any master: they are how this machine finds its masters.

use crate::output::{self, confirm, OutputFormat};
use crate::table::{Column, Table};
use clap::Subcommand;
use sloth_core::{paths, SystemClock};
use sloth_registry::MasterStore;

#[derive(Subcommand)]
pub enum MasterCmd {
    /// List known masters
    List,
    /// Add a master (the first one added becomes the default)
    Add {
        name: String,
        address: String,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove a master
    Remove {
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Promote a master to the default
    SetDefault { name: String },
}

pub fn run(format: OutputFormat, command: MasterCmd) -> anyhow::Result<()> {
    let store = MasterStore::open(&paths::data_dir(), SystemClock)?;

    match command {
        MasterCmd::List => {
            let masters = store.list();
            match format {
                OutputFormat::Json => output::print_json(&masters),
                OutputFormat::Table => {
                    if masters.is_empty() {
                        println!("No masters configured");
                        return Ok(());
                    }
                    let mut table = Table::new(vec![
                        Column::left("NAME"),
                        Column::left("ADDRESS"),
                        Column::left("DEFAULT"),
                        Column::left("DESCRIPTION"),
                    ]);
                    for master in masters {
                        table.row(vec![
                            master.name,
                            master.address,
                            if master.is_default { "*".to_string() } else { String::new() },
                            master.description,
                        ]);
                    }
                    table.render(&mut std::io::stdout());
                    Ok(())
                }
            }
        }
        MasterCmd::Add {
            name,
            address,
            description,
        } => {
            let record = store.add(&name, &address, &description)?;
            match format {
                OutputFormat::Json => output::print_json(&record),
                OutputFormat::Table => {
                    let default = if record.is_default { " (default)" } else { "" };
                    println!("added '{}' -> {}{default}", record.name, record.address);
                    Ok(())
                }
            }
        }
        MasterCmd::Remove { name, force } => {
            if !confirm(&format!("Remove master '{name}'?"), force)? {
                return Ok(());
            }
            store.remove(&name)?;
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
        MasterCmd::SetDefault { name } => {
            store.set_default(&name)?;
            match format {
                OutputFormat::Json => {
                    output::print_json(&serde_json::json!({"default": name}))
                }
                OutputFormat::Table => {
                    println!("'{name}' is now the default master");
                    Ok(())
                }
            }
        }
    }
}
