// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition-root errors (spec.md §7): every collaborator's error type
//! folded into one enum so `Daemon`'s public methods have a single
//! `Result` to return.

use iml_core::{ErrorKind, IntoErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Storage(#[from] iml_storage::StorageError),

    #[error(transparent)]
    Engine(#[from] iml_engine::EngineError),

    #[error(transparent)]
    Trigger(#[from] iml_triggers::TriggerError),

    #[error("plan {0} not found")]
    PlanNotFound(iml_core::PlanId),

    #[error("approval decision for plan {plan_id} action {action_id} has no pending request")]
    NoPendingApproval { plan_id: iml_core::PlanId, action_id: iml_core::ActionId },

    #[error("synchronous submission of plan {0} did not finish within the hard timeout")]
    SubmitTimedOut(iml_core::PlanId),
}

impl IntoErrorKind for DaemonError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            DaemonError::Storage(e) => e.error_kind(),
            DaemonError::Engine(e) => e.error_kind(),
            DaemonError::Trigger(iml_triggers::TriggerError::NotFound(_)) => ErrorKind::NotFound,
            DaemonError::Trigger(iml_triggers::TriggerError::Storage(e)) => e.error_kind(),
            DaemonError::Trigger(_) => ErrorKind::Internal,
            DaemonError::PlanNotFound(_) => ErrorKind::PlanNotFound,
            DaemonError::NoPendingApproval { .. } => ErrorKind::NotFound,
            DaemonError::SubmitTimedOut(_) => ErrorKind::Timeout,
        }
    }
}
