// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler errors (spec.md §7).

use iml_core::{ErrorKind, IntoErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("dependency cycle detected: {0:?}")]
    DagCycle(Vec<String>),

    #[error("action {0:?} is not in this plan")]
    UnknownAction(String),
}

impl IntoErrorKind for SchedulerError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            SchedulerError::DagCycle(_) => ErrorKind::DagCycle,
            SchedulerError::UnknownAction(_) => ErrorKind::ActionNotFound,
        }
    }
}
