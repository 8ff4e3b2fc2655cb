// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer errors (spec.md §4.4, §7).

use iml_core::{ErrorKind, IntoErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("plan {0} already exists")]
    PlanAlreadyExists(String),

    #[error("plan {0} not found")]
    PlanNotFound(String),

    #[error("trigger {0} not found")]
    TriggerNotFound(String),

    #[error("cannot transition plan {plan_id} from terminal status {from} to {to}")]
    InvalidPlanTransition { plan_id: String, from: String, to: String },

    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("failed to serialise column: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("invalid stored value in column {column}: {value:?}")]
    InvalidData { column: &'static str, value: String },
}

impl IntoErrorKind for StorageError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            StorageError::PlanAlreadyExists(_) => ErrorKind::PlanAlreadyExists,
            StorageError::PlanNotFound(_) | StorageError::TriggerNotFound(_) => {
                ErrorKind::PlanNotFound
            }
            StorageError::InvalidPlanTransition { .. } => ErrorKind::InvalidStateTransition,
            StorageError::Backend(_)
            | StorageError::Serialisation(_)
            | StorageError::InvalidData { .. } => ErrorKind::StorageError,
        }
    }
}
