// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (SPEC_FULL.md §B.3): the policy knobs every
//! security/engine collaborator needs, collected into one value the
//! (unbuilt) outer layer constructs once at startup — no file/env/CLI
//! loading here, that's its job.
//!
//! Shape grounded on `iml-core`'s own `JobConfig`/`JobConfigBuilder`
//! (`crates/core/src/job.rs`): a required-args constructor returning a
//! builder, `iml_core::setters!` for the optional fields, and a plain
//! `build()`.

use iml_core::{ModuleId, PermissionProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Per-`module.action` rate limit (spec.md §4.10). A serializable mirror of
/// `iml_engine::RateLimitConfig`, which doesn't derive `Serialize` itself.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub per_minute: Option<usize>,
    pub per_hour: Option<usize>,
}

impl From<RateLimitRule> for iml_engine::RateLimitConfig {
    fn from(rule: RateLimitRule) -> Self {
        iml_engine::RateLimitConfig { per_minute: rule.per_minute, per_hour: rule.per_hour }
    }
}

/// Policy for a pending approval that never receives a decision (spec.md
/// §4.9). Serializable mirror of `iml_security::OnTimeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalTimeoutPolicy {
    TreatAsReject,
    TreatAsSkip,
}

impl From<ApprovalTimeoutPolicy> for iml_security::OnTimeout {
    fn from(policy: ApprovalTimeoutPolicy) -> Self {
        match policy {
            ApprovalTimeoutPolicy::TreatAsReject => iml_security::OnTimeout::TreatAsReject,
            ApprovalTimeoutPolicy::TreatAsSkip => iml_security::OnTimeout::TreatAsSkip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub database_url: String,
    pub permission_profile: PermissionProfile,
    pub sandbox_roots: Vec<PathBuf>,
    pub scanner_fail_fast: bool,
    pub scanner_reject_threshold: f64,
    pub sanitiser_max_str_len: usize,
    pub sanitiser_max_depth: usize,
    pub sanitiser_max_list_items: usize,
    pub rate_limits: HashMap<String, RateLimitRule>,
    pub resource_default_limit: usize,
    pub resource_overrides: HashMap<ModuleId, usize>,
    pub fallback_chains: HashMap<ModuleId, Vec<ModuleId>>,
    pub approval_timeout_seconds: u64,
    pub approval_on_timeout: ApprovalTimeoutPolicy,
    pub rollback_timeout_seconds: u64,
}

impl DaemonConfig {
    pub fn builder(
        database_url: impl Into<String>,
        permission_profile: PermissionProfile,
    ) -> DaemonConfigBuilder {
        DaemonConfigBuilder {
            database_url: database_url.into(),
            permission_profile,
            sandbox_roots: Vec::new(),
            scanner_fail_fast: false,
            scanner_reject_threshold: 0.9,
            sanitiser_max_str_len: 50_000,
            sanitiser_max_depth: 10,
            sanitiser_max_list_items: 1_000,
            rate_limits: HashMap::new(),
            resource_default_limit: 10,
            resource_overrides: HashMap::new(),
            fallback_chains: HashMap::new(),
            approval_timeout_seconds: 300,
            approval_on_timeout: ApprovalTimeoutPolicy::TreatAsReject,
            rollback_timeout_seconds: 30,
        }
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_seconds)
    }

    pub fn rollback_timeout(&self) -> Duration {
        Duration::from_secs(self.rollback_timeout_seconds)
    }
}

pub struct DaemonConfigBuilder {
    database_url: String,
    permission_profile: PermissionProfile,
    sandbox_roots: Vec<PathBuf>,
    scanner_fail_fast: bool,
    scanner_reject_threshold: f64,
    sanitiser_max_str_len: usize,
    sanitiser_max_depth: usize,
    sanitiser_max_list_items: usize,
    rate_limits: HashMap<String, RateLimitRule>,
    resource_default_limit: usize,
    resource_overrides: HashMap<ModuleId, usize>,
    fallback_chains: HashMap<ModuleId, Vec<ModuleId>>,
    approval_timeout_seconds: u64,
    approval_on_timeout: ApprovalTimeoutPolicy,
    rollback_timeout_seconds: u64,
}

impl DaemonConfigBuilder {
    iml_core::setters! {
        set {
            sandbox_roots: Vec<PathBuf>,
            scanner_fail_fast: bool,
            scanner_reject_threshold: f64,
            sanitiser_max_str_len: usize,
            sanitiser_max_depth: usize,
            sanitiser_max_list_items: usize,
            rate_limits: HashMap<String, RateLimitRule>,
            resource_default_limit: usize,
            resource_overrides: HashMap<ModuleId, usize>,
            fallback_chains: HashMap<ModuleId, Vec<ModuleId>>,
            approval_timeout_seconds: u64,
            approval_on_timeout: ApprovalTimeoutPolicy,
            rollback_timeout_seconds: u64,
        }
    }

    pub fn build(self) -> DaemonConfig {
        DaemonConfig {
            database_url: self.database_url,
            permission_profile: self.permission_profile,
            sandbox_roots: self.sandbox_roots,
            scanner_fail_fast: self.scanner_fail_fast,
            scanner_reject_threshold: self.scanner_reject_threshold,
            sanitiser_max_str_len: self.sanitiser_max_str_len,
            sanitiser_max_depth: self.sanitiser_max_depth,
            sanitiser_max_list_items: self.sanitiser_max_list_items,
            rate_limits: self.rate_limits,
            resource_default_limit: self.resource_default_limit,
            resource_overrides: self.resource_overrides,
            fallback_chains: self.fallback_chains,
            approval_timeout_seconds: self.approval_timeout_seconds,
            approval_on_timeout: self.approval_on_timeout,
            rollback_timeout_seconds: self.rollback_timeout_seconds,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
