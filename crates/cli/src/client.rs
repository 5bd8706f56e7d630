// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master client construction with address resolution.

use sloth_core::paths;
use sloth_wire::Client;

/// Build a client for the master.
///
/// Priority: explicit `--master` flag → `SLOTH_RUNNER_MASTER_ADDR` →
/// `<data_dir>/master.conf` → `localhost:50051`.
pub fn master_client(flag: Option<&str>) -> Client {
    let address = match flag {
        Some(address) if !address.is_empty() => address.to_string(),
        _ => paths::master_address(),
    };
    Client::new(address)
}
