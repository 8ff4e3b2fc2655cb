// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IML plan and action data model (spec.md §3).

use crate::ids::{ActionId, ModuleId, PlanId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const PROTOCOL_VERSION: &str = "2.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
    Reactive,
}

crate::simple_display! {
    ExecutionMode {
        Sequential => "sequential",
        Parallel => "parallel",
        Reactive => "reactive",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OnError {
    Halt,
    Continue,
    Retry,
    Escalate,
}

crate::simple_display! {
    OnError {
        Halt => "HALT",
        Continue => "CONTINUE",
        Retry => "RETRY",
        Escalate => "ESCALATE",
    }
}

impl Default for OnError {
    fn default() -> Self {
        Self::Halt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "RetryPolicy::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "RetryPolicy::default_backoff_seconds")]
    pub backoff_seconds: f64,
}

impl RetryPolicy {
    fn default_max_attempts() -> u32 {
        1
    }

    fn default_backoff_seconds() -> f64 {
        1.0
    }

    /// `retry.backoff_seconds × 2^(attempt-1)`, per spec.md §4.12.
    pub fn backoff_for_attempt(&self, attempt: u32) -> f64 {
        self.backoff_seconds * 2f64.powi(attempt.saturating_sub(1) as i32)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            backoff_seconds: Self::default_backoff_seconds(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevelHint {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalSpec {
    pub message: String,
    #[serde(default)]
    pub risk_level: Option<RiskLevelHint>,
    #[serde(default)]
    pub clarification_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionSpec {
    #[serde(default)]
    pub before: bool,
    #[serde(default)]
    pub after: bool,
}

/// `IMLAction` (spec.md §3). `rollback` is boxed because it is itself a
/// full action fragment, making the type recursive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IMLAction {
    pub id: ActionId,
    pub module: ModuleId,
    pub action: String,
    #[serde(default)]
    pub params: HashMap<String, Value>,
    #[serde(default)]
    pub depends_on: Vec<ActionId>,
    #[serde(default)]
    pub on_error: OnError,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub approval: Option<ApprovalSpec>,
    #[serde(default)]
    pub rollback: Option<Box<IMLAction>>,
    #[serde(default)]
    pub target_node: Option<String>,
    #[serde(default)]
    pub perception: Option<PerceptionSpec>,
}

impl IMLAction {
    pub fn target_node(&self) -> &str {
        self.target_node.as_deref().unwrap_or("local")
    }

    pub fn depends_on_self(&self) -> bool {
        self.depends_on.iter().any(|d| *d == self.id)
    }
}

/// `IMLPlan` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IMLPlan {
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    pub plan_id: PlanId,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_execution_mode")]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub module_requirements: HashMap<ModuleId, String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub actions: Vec<IMLAction>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

fn default_execution_mode() -> ExecutionMode {
    ExecutionMode::Sequential
}

impl IMLPlan {
    pub fn action_ids(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.iter().map(|a| &a.id)
    }

    pub fn find_action(&self, id: &ActionId) -> Option<&IMLAction> {
        self.actions.iter().find(|a| &a.id == id)
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct IMLActionBuilder => IMLAction {
        into { id: ActionId = ActionId::from("a1") }
        into { module: ModuleId = ModuleId::new("filesystem") }
        into { action: String = "read_file" }
        set { params: HashMap<String, Value> = HashMap::new() }
        set { depends_on: Vec<ActionId> = Vec::new() }
        set { on_error: OnError = OnError::Halt }
        set { retry: RetryPolicy = RetryPolicy::default() }
        set { requires_approval: bool = false }
        option { approval: ApprovalSpec = None }
        computed { rollback: Option<Box<IMLAction>> = None }
        set { target_node: Option<String> = None }
        set { perception: Option<PerceptionSpec> = None }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct IMLPlanBuilder => IMLPlan {
        set { protocol_version: String = PROTOCOL_VERSION.to_string() }
        into { plan_id: PlanId = PlanId::from("pln-test") }
        into { description: String = "" }
        set { execution_mode: ExecutionMode = ExecutionMode::Sequential }
        option { session_id: String = None }
        set { module_requirements: HashMap<ModuleId, String> = HashMap::new() }
        set { metadata: HashMap<String, Value> = HashMap::new() }
        set { actions: Vec<IMLAction> = Vec::new() }
        option { timeout_seconds: u64 = None }
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
