// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task: accepts connections and dispatches requests to handlers.
//!
//! One spawned task per connection; the shared context serializes inside
//! each component store, so handlers never coordinate with each other.

use crate::handlers;
use crate::lifecycle::MasterCtx;
use sloth_wire::{self as wire, Request, WireError, DEFAULT_TIMEOUT};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Listener over the master's bind address.
pub struct Listener {
    socket: TcpListener,
    ctx: Arc<MasterCtx>,
}

impl Listener {
    pub fn new(socket: TcpListener, ctx: Arc<MasterCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop, spawning a task per connection.
    pub async fn run(self) {
        info!("listener running");
        loop {
            match self.socket.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                WireError::ConnectionClosed => debug!("client disconnected"),
                                WireError::Timeout => warn!("connection timeout"),
                                _ => error!(error = %e, "connection error"),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, ctx: &MasterCtx) -> Result<(), WireError> {
    let (mut reader, mut writer) = stream.split();

    let request = wire::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Heartbeats and event batches arrive constantly; keep them at debug
    match &request {
        Request::Heartbeat { .. } | Request::SendEventBatch { .. } | Request::Ping => {
            debug!(request = ?request, "received request");
        }
        other => info!(request = ?other, "received request"),
    }

    let response = handlers::handle_request(ctx, request).await;
    wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
