// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security enforcement pipeline: Permission Guard, Scanner Pipeline,
//! Output Sanitiser, Approval Gate, Rate Limiter, and Resource Manager
//! (spec.md §4.6–§4.11).

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod approval;
pub mod error;
pub mod glob;
pub mod permission;
pub mod rate_limit;
pub mod resource;
pub mod sanitiser;
pub mod scanner;

pub use approval::{ApprovalDecision, ApprovalGate, ApprovalRequest, DecisionKind, OnTimeout};
pub use error::SecurityError;
pub use glob::{glob_matches, glob_to_regex};
pub use permission::PermissionGuard;
pub use rate_limit::{RateLimiter, WindowCounts};
pub use resource::{ModuleStatus, ResourceGuard, ResourceManager};
pub use sanitiser::{sanitise, SanitiserConfig};
pub use scanner::{
    flatten_for_scan, HeuristicScanner, InputScanner, ScanContext, ScanResult, ScanVerdict, ScannerConfig,
    ScannerPipeline,
};
