// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval Gate (spec.md §4.9).

use iml_core::{ActionId, DecisionId, PlanId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Approve,
    Reject,
    Skip,
    Modify,
    ApproveAlways,
}

#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub plan_id: PlanId,
    pub action_id: ActionId,
    pub module: String,
    pub action: String,
    pub message: String,
    pub params: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub kind: DecisionKind,
    /// Present only for `DecisionKind::Modify`: the replacement params.
    pub modified_params: Option<HashMap<String, Value>>,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        Self { kind: DecisionKind::Approve, modified_params: None }
    }
}

/// What to do when a pending approval times out (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnTimeout {
    TreatAsReject,
    TreatAsSkip,
}

struct Pending {
    request: ApprovalRequest,
    responder: oneshot::Sender<ApprovalDecision>,
}

/// Single-process cooperative approval queue. Not `Sync` across an
/// event loop boundary by design (spec.md §4.9): one daemon, one gate.
#[derive(Default)]
pub struct ApprovalGate {
    pending: Arc<Mutex<HashMap<DecisionId, Pending>>>,
    auto_approve: Arc<Mutex<std::collections::HashSet<String>>>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self { pending: Arc::new(Mutex::new(HashMap::new())), auto_approve: Arc::new(Mutex::new(Default::default())) }
    }

    pub fn mark_auto_approved(&self, module: &str, action: &str) {
        self.auto_approve.lock().insert(format!("{module}.{action}"));
    }

    fn is_auto_approved(&self, module: &str, action: &str) -> bool {
        self.auto_approve.lock().contains(&format!("{module}.{action}"))
    }

    /// Blocks until a decision is submitted via [`submit_decision`] or
    /// `timeout` elapses, in which case `on_timeout` determines the
    /// synthesised outcome.
    pub async fn request_approval(
        &self,
        request: ApprovalRequest,
        timeout: Duration,
        on_timeout: OnTimeout,
    ) -> ApprovalDecision {
        if self.is_auto_approved(&request.module, &request.action) {
            return ApprovalDecision::approve();
        }

        let id = DecisionId::new();
        let module = request.module.clone();
        let action = request.action.clone();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id.clone(), Pending { request, responder: tx });

        let decision = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(decision)) => decision,
            // Channel dropped or the wait timed out: synthesise per policy.
            Ok(Err(_)) | Err(_) => match on_timeout {
                OnTimeout::TreatAsReject => ApprovalDecision { kind: DecisionKind::Reject, modified_params: None },
                OnTimeout::TreatAsSkip => ApprovalDecision { kind: DecisionKind::Skip, modified_params: None },
            },
        };

        self.pending.lock().remove(&id);
        if decision.kind == DecisionKind::ApproveAlways {
            self.mark_auto_approved(&module, &action);
        }
        decision
    }

    pub fn submit_decision(&self, id: &DecisionId, decision: ApprovalDecision) -> bool {
        let pending = self.pending.lock().remove(id);
        match pending {
            Some(p) => {
                if decision.kind == DecisionKind::ApproveAlways {
                    self.mark_auto_approved(&p.request.module, &p.request.action);
                }
                p.responder.send(decision).is_ok()
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn get_pending(&self, plan_id: Option<&PlanId>) -> Vec<(DecisionId, ApprovalRequest)> {
        self.pending
            .lock()
            .iter()
            .filter(|(_, p)| plan_id.is_none_or(|pid| &p.request.plan_id == pid))
            .map(|(id, p)| (id.clone(), p.request.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
