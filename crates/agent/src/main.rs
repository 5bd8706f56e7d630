// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sloth-agent binary: register, heartbeat, watch, execute.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;
use sloth_agent::event_worker::{EventWorker, WireTransport, DEFAULT_BATCH_SIZE};
use sloth_agent::{listener, runtime};
use sloth_core::paths;
use sloth_watcher::{EventSink, WatcherManager, WatcherStore};
use sloth_wire::Client;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sloth-agent", version, about = "sloth-runner agent daemon")]
struct Args {
    /// Agent name; defaults to the hostname
    #[arg(long)]
    name: Option<String>,

    /// Address to bind the task listener on
    #[arg(long, default_value = "0.0.0.0:50052")]
    bind: String,

    /// Address advertised to the master; defaults to the bind address
    #[arg(long)]
    advertise: Option<String>,

    /// Master address; defaults to SLOTH_RUNNER_MASTER_ADDR / master.conf
    #[arg(long)]
    master: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logging();

    let name = match args.name {
        Some(name) => name,
        None => hostname::get()?.to_string_lossy().to_string(),
    };
    let master_address = args.master.unwrap_or_else(paths::master_address);
    let advertise = args.advertise.clone().unwrap_or_else(|| args.bind.clone());

    let identity = runtime::AgentIdentity {
        name: name.clone(),
        advertise_address: advertise,
    };
    let master = Client::new(master_address.clone());

    // Task listener first, so the advertised address is live at registration
    let tcp = TcpListener::bind(&args.bind).await?;
    info!(bind = %args.bind, "task listener bound");
    tokio::spawn(listener::run(tcp));

    runtime::register(&master, &identity).await?;

    // Event worker ships watcher events to the master
    let transport = Arc::new(WireTransport::new(master_address, DEFAULT_BATCH_SIZE));
    let worker = EventWorker::new(name.clone(), transport);
    worker.start();

    // Watchers persist across restarts; load and start them all
    let store = WatcherStore::open_at(&paths::watcher_db_path())?;
    let manager = Arc::new(WatcherManager::new(
        store,
        Arc::new(worker.clone()) as Arc<dyn EventSink>,
    ));
    manager.start();

    let token = CancellationToken::new();
    tokio::spawn(runtime::heartbeat_loop(
        master.clone(),
        identity.clone(),
        token.clone(),
    ));
    tokio::spawn(runtime::metrics_loop(
        master.clone(),
        identity.clone(),
        token.clone(),
    ));

    info!(agent = %name, "agent ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    token.cancel();
    manager.stop().await;
    worker.stop().await;

    // Registration is durable: the master will report us Inactive once the
    // heartbeat goes stale, and re-registration on next start reuses it.
    info!("agent stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
