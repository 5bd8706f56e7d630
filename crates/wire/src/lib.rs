// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! RPC protocol for master ↔ agent ↔ CLI communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload, one
//! request/response exchange per connection. The cryptographic transport
//! layer is out of scope here; addresses come from master-address
//! resolution or the agent registry.

mod client;
mod codec;
mod request;

pub use client::Client;
pub use codec::{
    decode, encode, read_message, read_request, write_message, write_response, WireError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
pub use request::{KvItem, KvRequest, Request, Response, StateRequest, TaskPayload};
