// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::ids::{ActionId, ModuleId, PlanId};
use crate::plan::{IMLAction, IMLPlan};

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::plan::{ExecutionMode, OnError};
    use proptest::prelude::*;

    pub fn arb_execution_mode() -> impl Strategy<Value = ExecutionMode> {
        prop_oneof![
            Just(ExecutionMode::Sequential),
            Just(ExecutionMode::Parallel),
            Just(ExecutionMode::Reactive),
        ]
    }

    pub fn arb_on_error() -> impl Strategy<Value = OnError> {
        prop_oneof![
            Just(OnError::Halt),
            Just(OnError::Continue),
            Just(OnError::Retry),
            Just(OnError::Escalate),
        ]
    }
}

/// A single-action plan with no dependencies, for tests that just need
/// "some valid plan".
pub fn single_action_plan(plan_id: &str, action_id: &str, module: &str, action: &str) -> IMLPlan {
    IMLPlan::builder()
        .plan_id(PlanId::from(plan_id))
        .actions(vec![IMLAction::builder()
            .id(ActionId::from(action_id))
            .module(ModuleId::new(module))
            .action(action)
            .build()])
        .build()
}

/// Two actions, `b` depending on `a`, for dependency-ordering tests.
pub fn chained_plan(plan_id: &str) -> IMLPlan {
    IMLPlan::builder()
        .plan_id(PlanId::from(plan_id))
        .actions(vec![
            IMLAction::builder()
                .id(ActionId::from("a1"))
                .module(ModuleId::new("filesystem"))
                .action("read_file")
                .build(),
            IMLAction::builder()
                .id(ActionId::from("a2"))
                .module(ModuleId::new("filesystem"))
                .action("write_file")
                .depends_on(vec![ActionId::from("a1")])
                .build(),
        ])
        .build()
}
