// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine errors (spec.md §7, §4.12, §4.16).

use iml_core::{ErrorKind, IntoErrorKind};
use iml_security::SecurityError;
use iml_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("module {0} failed to load: {1}")]
    ModuleLoadError(String, String),

    #[error("action not found: {module}.{action}")]
    ActionNotFound { module: String, action: String },

    #[error("action {module}.{action} failed: {source}")]
    ActionExecutionError { module: String, action: String, source: String },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node {0} is not available")]
    NodeUnavailable(String),

    #[error("action timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("template error: {0}")]
    Template(#[from] iml_protocol::ProtocolError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] iml_scheduler::SchedulerError),

    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoErrorKind for EngineError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            EngineError::ModuleNotFound(_) => ErrorKind::ModuleNotFound,
            EngineError::ModuleLoadError(..) => ErrorKind::ModuleLoadError,
            EngineError::ActionNotFound { .. } => ErrorKind::ActionNotFound,
            EngineError::ActionExecutionError { .. } => ErrorKind::ActionExecutionError,
            EngineError::NodeNotFound(_) => ErrorKind::ModuleNotFound,
            EngineError::NodeUnavailable(_) => ErrorKind::ActionExecutionError,
            EngineError::Timeout(_) => ErrorKind::Timeout,
            EngineError::Template(e) => e.error_kind(),
            EngineError::Scheduler(e) => e.error_kind(),
            EngineError::Security(e) => e.error_kind(),
            EngineError::Storage(e) => e.error_kind(),
        }
    }
}
