// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication (spec.md §6).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. This
//! crate is data-only: it defines the `Request`/`Response` contract and
//! the framing functions that turn them into bytes; it never opens a
//! socket itself.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod types;
mod wire;

pub use request::Request;
pub use response::Response;
pub use types::{
    ActionSummary, ApprovalDecisionPayload, ErrorKind, GroupSummary, PlanFilter, PlanResultSummary,
    PlanSummary, WireDecisionKind,
};
pub use wire::{decode, encode, read_message, read_request, write_message, write_response, ProtocolError};
