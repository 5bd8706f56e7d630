// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-side listener: accepts task dispatches from the master.

use crate::dispatch;
use sloth_wire::{self as wire, Request, Response, WireError, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

/// Accept loop; each connection is handled in its own task.
pub async fn run(listener: TcpListener) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream).await {
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

async fn handle_connection(mut stream: TcpStream) -> Result<(), WireError> {
    let (mut reader, mut writer) = stream.split();
    let request = wire::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    let response = handle_request(request).await;
    // Task output can be slow to drain; give the write its own deadline
    wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await
}

async fn handle_request(request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },
        Request::RunTask { payload } => match dispatch::run_task(&payload).await {
            Ok(outcome) => Response::TaskResult {
                exit_code: outcome.exit_code,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
            },
            Err(e) => Response::error(e),
        },
        other => Response::error(format!("unsupported request for agent: {other:?}")),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
