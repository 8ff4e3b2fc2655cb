// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security-pipeline errors (spec.md §7).

use iml_core::{ErrorKind, IntoErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("permission denied: {module}.{action} under profile {profile}")]
    PermissionDenied { module: String, action: String, profile: String },

    #[error("approval required for {module}.{action}")]
    ApprovalRequired { module: String, action: String },

    #[error("rate limit exceeded for {key}: {limit} per {window}")]
    RateLimitExceeded { key: String, limit: u32, window: String },

    #[error("plan rejected by scanner pipeline: {0}")]
    ScannerRejected(String),

    #[error("path {0:?} escapes all sandbox roots")]
    SandboxViolation(String),
}

impl IntoErrorKind for SecurityError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            SecurityError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            SecurityError::ApprovalRequired { .. } => ErrorKind::ApprovalRequired,
            SecurityError::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            SecurityError::ScannerRejected(_) => ErrorKind::ScannerRejected,
            SecurityError::SandboxViolation(_) => ErrorKind::PermissionDenied,
        }
    }
}
