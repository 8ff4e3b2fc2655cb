// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supporting DTOs shared between [`crate::Request`] and [`crate::Response`]
//! (spec.md §6).

use iml_core::{ActionId, ActionStatus, PlanId, PlanStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filter accepted by `list_plans` (spec.md §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,
}

/// One row of a `list_plans` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSummary {
    pub plan_id: PlanId,
    pub status: PlanStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-action snapshot returned from a synchronous `submit_plan` (spec.md §6:
/// "Returns `actions` only when synchronous").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionSummary {
    pub action_id: ActionId,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-plan outcome inside a `submit_plan_group` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanResultSummary {
    pub plan_id: PlanId,
    pub status: PlanStatus,
}

/// Aggregate counters for a `submit_plan_group` response.
///
/// `completed`/`failed`/`cancelled` are per-plan tallies; `partial_failure`
/// is a 0/1 flag on the group as a whole, not a fourth per-plan bucket —
/// `PlanStatus` has no "partial failure" variant of its own, only the
/// aggregate `GroupStatus` does, so this is the only place that distinction
/// shows up in the wire contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupSummary {
    pub completed: usize,
    pub partial_failure: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Mirrors `iml_security::DecisionKind` at the wire boundary so this crate
/// never has to depend on `iml-security` for a five-variant enum (spec.md §6
/// `submit_approval_decision`). `iml-daemon` maps this onto the real type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireDecisionKind {
    Approve,
    Reject,
    Skip,
    Modify,
    ApproveAlways,
}

/// Wire shape of `submit_approval_decision`'s payload (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalDecisionPayload {
    pub decision: WireDecisionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// Error taxonomy tag (spec.md §7), carried alongside `Response::Error`'s
/// message so a client can branch on kind without string-matching.
///
/// Re-exported rather than redefined: `iml-wire` already depends on
/// `iml-core` (for `PlanId` et al.), so a wire-local duplicate of its
/// `ErrorKind` would just be two enums to keep in sync for no reason.
pub use iml_core::ErrorKind;
