// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound request DTOs (spec.md §6 "Inbound (from an HTTP/CLI/WebSocket
//! front-end)").

use crate::types::{ApprovalDecisionPayload, PlanFilter};
use iml_core::{ActionId, PlanId, TriggerDefinition, TriggerId};
use serde::{Deserialize, Serialize};

/// Every request the daemon accepts over the wire.
///
/// No `PartialEq` derive: `IMLPlan`/`TriggerDefinition` don't derive it
/// either (both nest unordered `HashMap`/param-bag fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Version handshake.
    Hello { version: String },
    /// Liveness probe.
    Ping,

    /// `submit_plan(plan_json, async)`. When `r#async` is false, the caller
    /// blocks until the plan reaches a terminal state or the 300s hard
    /// timeout (spec.md §6).
    SubmitPlan {
        plan: iml_core::IMLPlan,
        #[serde(rename = "async", default)]
        r#async: bool,
    },
    /// `get_plan(plan_id)`.
    GetPlan { plan_id: PlanId },
    /// `list_plans(filter, page, per_page)`.
    ListPlans {
        #[serde(default)]
        filter: PlanFilter,
        #[serde(default = "default_page")]
        page: u32,
        #[serde(default = "default_per_page")]
        per_page: u32,
    },
    /// `cancel_plan(plan_id)`.
    CancelPlan { plan_id: PlanId },
    /// `submit_plan_group(plans, max_concurrent, timeout, group_id?)`.
    SubmitPlanGroup {
        plans: Vec<iml_core::IMLPlan>,
        max_concurrent: usize,
        timeout_seconds: u64,
        #[serde(default)]
        group_id: Option<String>,
    },
    /// `submit_approval_decision(plan_id, action_id, decision, ...)`.
    SubmitApprovalDecision {
        plan_id: PlanId,
        action_id: ActionId,
        #[serde(flatten)]
        payload: ApprovalDecisionPayload,
    },

    /// Trigger CRUD (spec.md §6 "Trigger CRUD: register, activate,
    /// deactivate, delete, list, get").
    RegisterTrigger { definition: TriggerDefinition },
    ActivateTrigger { trigger_id: TriggerId },
    DeactivateTrigger { trigger_id: TriggerId },
    DeleteTrigger { trigger_id: TriggerId },
    ListTriggers,
    GetTrigger { trigger_id: TriggerId },
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
