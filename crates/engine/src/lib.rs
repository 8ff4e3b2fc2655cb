// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iml-engine: the Plan Executor and Plan Group Executor (spec.md §4.12,
//! §4.13), plus the collaborators they dispatch through — the Module
//! Registry, Node Registry, and Session Context Propagator (spec.md §4.15,
//! §4.16).

pub mod alternatives;
pub mod error;
pub mod group_executor;
pub mod module;
pub mod node;
pub mod plan_executor;
pub mod registry;
pub mod session;

pub use error::EngineError;
pub use group_executor::{GroupResult, GroupStatus, PlanGroupExecutor};
pub use module::BaseModule;
pub use node::{BaseNode, LocalNode, NodeRegistry, LOCAL_NODE};
pub use plan_executor::{ExecutorConfig, PlanExecutor, RateLimitConfig};
pub use registry::{ModuleRegistry, ModuleRegistryBuilder};
pub use session::SessionContextPropagator;
