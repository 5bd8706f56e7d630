// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sloth: CLI for the sloth-runner platform.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;
mod table;

use clap::{Parser, Subcommand};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "sloth", version, about = "sloth-runner: distributed task orchestration")]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table
    )]
    output: OutputFormat,

    /// Master address (overrides SLOTH_RUNNER_MASTER_ADDR and master.conf)
    #[arg(long, global = true)]
    master: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keyed state store and workflow state
    State {
        #[command(subcommand)]
        command: commands::state::StateCmd,
    },
    /// Fleet agents
    Agent {
        #[command(subcommand)]
        command: commands::agent::AgentCmd,
    },
    /// Known master endpoints
    Master {
        #[command(subcommand)]
        command: commands::master::MasterCmd,
    },
    /// Dispatch a task to an agent
    Run(commands::run::RunArgs),
    /// Recent events ingested by the master
    Events(commands::events::EventsArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.output;

    if let Err(e) = run(cli).await {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            }
            OutputFormat::Table => {
                eprintln!("error: {e:#}");
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = client::master_client(cli.master.as_deref());
    match cli.command {
        Commands::State { command } => commands::state::run(&client, cli.output, command).await,
        Commands::Agent { command } => commands::agent::run(&client, cli.output, command).await,
        Commands::Master { command } => commands::master::run(cli.output, command),
        Commands::Run(args) => commands::run::run(&client, cli.output, args).await,
        Commands::Events(args) => commands::events::run(&client, cli.output, args).await,
    }
}
