// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event streaming substrate: the `EventBus` trait and its
//! Null/Log/Fanout/Router implementations, plus the standard topic names
//! (spec.md §4.5).

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bus;
pub mod router;
pub mod topics;

pub use bus::{EventBus, FanoutEventBus, LogEventBus, NullEventBus};
pub use router::{topic_matches, EventRouter};
