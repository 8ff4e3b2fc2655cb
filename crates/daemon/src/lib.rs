// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IML Daemon composition root.
//!
//! Wires the State Store, Event Bus, security pipeline (Permission Guard,
//! Scanner Pipeline, Rate Limiter, Resource Manager, Approval Gate),
//! Plan/Group Executor, and Trigger Daemon into a single [`Daemon`] handle
//! and exposes spec.md §6's external interface as plain async methods.
//! No HTTP/WebSocket/CLI front-end lives here (spec.md §1 Non-goals) —
//! this crate is a library an outer transport layer embeds.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod daemon;
pub mod error;
pub mod memory;
pub mod telemetry;

pub use config::{ApprovalTimeoutPolicy, DaemonConfig, DaemonConfigBuilder, RateLimitRule};
pub use daemon::Daemon;
pub use error::DaemonError;
pub use memory::KeyValueMemoryStore;
pub use telemetry::{init_tracing, init_tracing_from_env};
