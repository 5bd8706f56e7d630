// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot RPC client: connect, send one request, read one response.

use crate::codec::{self, WireError, DEFAULT_TIMEOUT};
use crate::request::{Request, Response};
use std::time::Duration;
use tokio::net::TcpStream;

/// RPC client addressing one listener (master or agent).
#[derive(Debug, Clone)]
pub struct Client {
    address: String,
    timeout: Duration,
}

impl Client {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call deadline (covers connect, write, and read).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one request and await the response.
    ///
    /// A remote-reported failure (`Response::Error`) surfaces as
    /// [`WireError::Remote`], so callers can `?` straight through.
    pub async fn call(&self, request: &Request) -> Result<Response, WireError> {
        let response = tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| WireError::Timeout)??;

        match response {
            Response::Error { message } => Err(WireError::Remote(message)),
            other => Ok(other),
        }
    }

    async fn exchange(&self, request: &Request) -> Result<Response, WireError> {
        let mut stream = TcpStream::connect(&self.address).await?;
        let (mut reader, mut writer) = stream.split();

        let data = codec::encode(request)?;
        codec::write_message(&mut writer, &data).await?;

        let bytes = codec::read_message(&mut reader).await?;
        codec::decode(&bytes)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
