// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sloth run`: dispatch a one-off task to an agent through the master.

use super::{call, unexpected};
use crate::output::{self, OutputFormat};
use clap::Args;
use sloth_wire::{Client, Request, Response, TaskPayload};
use std::collections::HashMap;

#[derive(Args)]
pub struct RunArgs {
    /// Agent to run on (must be live)
    #[arg(long)]
    pub agent: String,

    /// Workflow stack label for event correlation
    #[arg(long, default_value = "")]
    pub stack: String,

    /// Run id label for event correlation
    #[arg(long, default_value = "")]
    pub run_id: String,

    /// KEY=VALUE environment entries for the task
    #[arg(long = "env", value_parser = parse_env)]
    pub env: Vec<(String, String)>,

    /// Task timeout in seconds (0 = agent default)
    #[arg(long, default_value_t = 0)]
    pub timeout: u64,

    /// Command line to execute
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

fn parse_env(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid env entry '{raw}', expected KEY=VALUE")),
    }
}

pub async fn run(client: &Client, format: OutputFormat, args: RunArgs) -> anyhow::Result<()> {
    let payload = TaskPayload {
        command: args.command.join(" "),
        stack: args.stack,
        run_id: args.run_id,
        env: args.env.into_iter().collect::<HashMap<_, _>>(),
        timeout_secs: args.timeout,
    };

    let response = call(client, Request::DispatchTask {
        agent: args.agent,
        payload,
    })
    .await?;
    let Response::TaskResult {
        exit_code,
        stdout,
        stderr,
    } = response
    else {
        return unexpected();
    };

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "exit_code": exit_code,
            "stdout": stdout,
            "stderr": stderr,
        }))?,
        OutputFormat::Table => {
            print!("{stdout}");
            eprint!("{stderr}");
        }
    }

    if exit_code != 0 {
        std::process::exit(exit_code.clamp(1, 255));
    }
    Ok(())
}
