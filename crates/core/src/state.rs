// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-plan execution state (spec.md §3, §4.4).

use crate::ids::{ActionId, PlanId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Rejected,
}

crate::simple_display! {
    PlanStatus {
        Queued => "QUEUED",
        Running => "RUNNING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
        Rejected => "REJECTED",
    }
}

impl PlanStatus {
    /// Terminal transition (COMPLETED/FAILED/CANCELLED/REJECTED) is final —
    /// spec.md §3 "ExecutionState" lifecycle note and invariant 3 (§8).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanStatus::Completed | PlanStatus::Failed | PlanStatus::Cancelled | PlanStatus::Rejected
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    WaitingApproval,
}

crate::simple_display! {
    ActionStatus {
        Pending => "PENDING",
        Running => "RUNNING",
        Completed => "COMPLETED",
        Failed => "FAILED",
        Skipped => "SKIPPED",
        WaitingApproval => "WAITING_APPROVAL",
    }
}

impl ActionStatus {
    /// Invariant 2 (§8): every action's final status is in
    /// {COMPLETED, FAILED, SKIPPED}.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActionStatus::Completed | ActionStatus::Failed | ActionStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalMetadata {
    pub decision: Option<String>,
    pub approved_by: Option<String>,
    pub reason: Option<String>,
}

/// `ActionState` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionState {
    pub action_id: ActionId,
    pub status: ActionStatus,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub finished_at: Option<i64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "ActionState::default_attempt")]
    pub attempt: u32,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub approval_metadata: Option<ApprovalMetadata>,
}

impl ActionState {
    fn default_attempt() -> u32 {
        1
    }

    pub fn pending(action_id: ActionId) -> Self {
        Self {
            action_id,
            status: ActionStatus::Pending,
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
            attempt: 1,
            alternatives: Vec::new(),
            approval_metadata: None,
        }
    }

    /// Idempotent finalisation, mirroring the template's
    /// `finalize_current_step` guard against double-application.
    pub fn finalize(&mut self, status: ActionStatus, finished_at: i64) {
        if self.finished_at.is_some() {
            return;
        }
        self.status = status;
        self.finished_at = Some(finished_at);
    }
}

/// `ExecutionState` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    pub plan_id: PlanId,
    pub plan_status: PlanStatus,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub actions: HashMap<ActionId, ActionState>,
    #[serde(default)]
    pub rejection_details: Option<Value>,
}

impl ExecutionState {
    pub fn new(plan_id: PlanId, now_ms: i64) -> Self {
        Self {
            plan_id,
            plan_status: PlanStatus::Queued,
            created_at: now_ms,
            updated_at: now_ms,
            actions: HashMap::new(),
            rejection_details: None,
        }
    }

    /// Invariant 2 (§8): no RUNNING/PENDING/WAITING_APPROVAL remains once
    /// the plan itself is terminal.
    pub fn all_actions_terminal(&self) -> bool {
        self.actions.values().all(|a| a.status.is_terminal())
    }

    pub fn any_action_failed(&self) -> bool {
        self.actions.values().any(|a| a.status == ActionStatus::Failed)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
