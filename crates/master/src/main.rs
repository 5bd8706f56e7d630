// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sloth-master daemon.
//!
//! Architecture:
//! - Listener task: accepts connections, one handler task per connection
//! - Component stores (registry, state engine, KV) serialize internally

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use sloth_master::{Config, Listener, LifecycleError, MasterDaemon};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("sloth-master {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("sloth-master {}", env!("CARGO_PKG_VERSION"));
                println!("sloth-runner master daemon - agent registry, workflow state, event sink");
                println!();
                println!("USAGE:");
                println!("    sloth-master");
                println!();
                println!("Listens on SLOTH_RUNNER_BIND_ADDR (default 0.0.0.0:50051); durable");
                println!("state lives under SLOTH_RUNNER_DATA_DIR.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: sloth-master [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load();

    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!("starting master daemon");

    let daemon = match MasterDaemon::startup(config.clone()) {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(lock_path)) => {
            eprintln!("sloth-master is already running");
            eprintln!("  lock: {}", lock_path.display());
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "failed to start master");
            return Err(e.into());
        }
    };

    let socket = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(bind = %config.bind_addr, "master ready");

    let listener = Listener::new(socket, Arc::clone(&daemon.ctx));
    tokio::spawn(listener.run());

    // Signal ready for parent process (e.g. systemd, CLI waiting for startup)
    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = daemon.ctx.shutdown.notified() => info!("shutdown requested via command"),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    daemon.shutdown();
    info!("master stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the log file at startup if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `master.log` → `.1` → `.2` → `.3`, deleting the oldest.
/// Best-effort: rotation failures never block startup.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let _ = std::fs::rename(format!("{log_str}.{i}"), format!("{log_str}.{}", i + 1));
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config
        .log_path
        .parent()
        .ok_or_else(|| std::io::Error::other("log path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;
    let file_name = config
        .log_path
        .file_name()
        .ok_or_else(|| std::io::Error::other("log path has no file name"))?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
