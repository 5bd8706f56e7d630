// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for behavioral specifications.

#![allow(dead_code)]

use sloth_master::{Config, Listener, MasterDaemon};
use sloth_wire::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// An in-process master served over a real TCP socket.
pub struct TestMaster {
    pub daemon: MasterDaemon,
    pub address: String,
}

impl TestMaster {
    /// Start a master over `dir`, listening on an ephemeral port.
    pub async fn start(dir: &Path) -> Self {
        let daemon = MasterDaemon::startup(Config {
            data_dir: dir.to_path_buf(),
            bind_addr: "127.0.0.1:0".to_string(),
            log_path: dir.join("logs").join("master.log"),
            lock_path: dir.join("master.lock"),
        })
        .unwrap();

        let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = socket.local_addr().unwrap().to_string();
        tokio::spawn(Listener::new(socket, Arc::clone(&daemon.ctx)).run());

        Self { daemon, address }
    }

    pub fn client(&self) -> Client {
        Client::new(self.address.clone())
    }
}
