// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol-layer errors (spec.md §7).

use iml_core::{ErrorKind, IntoErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("plan JSON malformed beyond repair: {0}")]
    ParseError(String),

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("dependency cycle detected: {0:?}")]
    DagCycle(Vec<String>),

    #[error("template reference {0:?} names an action not in this plan")]
    UnknownTemplateReference(String),

    #[error("template resolution failed: {0}")]
    TemplateError(String),
}

impl IntoErrorKind for ProtocolError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            ProtocolError::ParseError(_) => ErrorKind::ParseError,
            ProtocolError::ValidationError(_) => ErrorKind::ValidationError,
            ProtocolError::DagCycle(_) => ErrorKind::DagCycle,
            ProtocolError::UnknownTemplateReference(_) => ErrorKind::ValidationError,
            ProtocolError::TemplateError(_) => ErrorKind::TemplateError,
        }
    }
}
