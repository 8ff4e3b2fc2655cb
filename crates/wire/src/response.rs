// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound response DTOs (spec.md §6, §7).

use crate::types::{ActionSummary, ErrorKind, GroupSummary, PlanResultSummary, PlanSummary};
use iml_core::{ExecutionState, PlanId, PlanStatus, TriggerDefinition, TriggerId};
use serde::{Deserialize, Serialize};

/// Every response the daemon sends over the wire.
///
/// No `PartialEq` derive: `Response::Plan` carries an `ExecutionState`,
/// which itself doesn't derive it (its `HashMap<ActionId, ActionState>`
/// makes equality an awkward thing to lean on anyway).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success with no further payload.
    Ok,
    /// Reply to `Request::Ping`.
    Pong,
    /// Reply to `Request::Hello`.
    Hello { version: String },
    /// Daemon is shutting down; no further requests will be served.
    ShuttingDown,

    /// Reply to `submit_plan`. `actions` is populated only for synchronous
    /// submissions (spec.md §6).
    PlanSubmitted {
        plan_id: PlanId,
        status: PlanStatus,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actions: Option<Vec<ActionSummary>>,
    },
    /// Reply to `get_plan`.
    Plan { state: Box<ExecutionState> },
    /// `get_plan` for an unknown `plan_id` (spec.md §6: "404 if unknown").
    PlanNotFound { plan_id: PlanId },
    /// Reply to `list_plans`.
    Plans { plans: Vec<PlanSummary>, total: usize, page: u32, per_page: u32 },
    /// Reply to `cancel_plan`.
    PlanCancelled { cancelled: bool },
    /// Reply to `submit_plan_group`.
    GroupResult {
        group_id: String,
        plan_results: Vec<PlanResultSummary>,
        errors: Vec<String>,
        summary: GroupSummary,
        duration_ms: u64,
    },
    /// Reply to `submit_approval_decision`.
    ApprovalApplied { applied: bool },

    /// Reply to `RegisterTrigger`.
    TriggerRegistered { trigger_id: TriggerId },
    /// Reply to `ActivateTrigger`/`DeactivateTrigger`.
    TriggerStateChanged { trigger_id: TriggerId },
    /// Reply to `DeleteTrigger`.
    TriggerDeleted { trigger_id: TriggerId },
    /// Reply to `ListTriggers`.
    Triggers { triggers: Vec<TriggerDefinition> },
    /// Reply to `GetTrigger`.
    Trigger { trigger: Option<Box<TriggerDefinition>> },

    /// Any failure path from the error taxonomy (spec.md §7).
    Error { kind: ErrorKind, message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
