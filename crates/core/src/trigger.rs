// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger definitions (spec.md §3 "TriggerDefinition", §4.14).

use crate::ids::TriggerId;
use crate::plan::IMLPlan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerState {
    Registered,
    Inactive,
    Active,
    Watching,
    Fired,
    Throttled,
    Failed,
}

crate::simple_display! {
    TriggerState {
        Registered => "REGISTERED",
        Inactive => "INACTIVE",
        Active => "ACTIVE",
        Watching => "WATCHING",
        Fired => "FIRED",
        Throttled => "THROTTLED",
        Failed => "FAILED",
    }
}

impl TriggerState {
    /// spec.md §3 invariant: "fires only when state ∈ {ACTIVE, WATCHING, FIRED}".
    pub fn is_fire_ready(self) -> bool {
        matches!(self, TriggerState::Active | TriggerState::Watching | TriggerState::Fired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictPolicy {
    Queue,
    Preempt,
    Reject,
}

crate::simple_display! {
    ConflictPolicy {
        Queue => "QUEUE",
        Preempt => "PREEMPT",
        Reject => "REJECT",
    }
}

/// Condition types, each with typed params (spec.md §4.14).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum TriggerCondition {
    Temporal {
        interval_seconds: Option<u64>,
        run_at: Option<i64>,
        schedule: Option<String>,
    },
    Filesystem {
        path: String,
        events: Vec<FilesystemEventKind>,
    },
    Process {
        process_name: String,
        present: bool,
    },
    Resource {
        metric: ResourceMetric,
        threshold: f64,
    },
    Composite {
        op: CompositeOp,
        conditions: Vec<TriggerCondition>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesystemEventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMetric {
    Cpu,
    Memory,
    Disk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompositeOp {
    And,
    Or,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerHealth {
    pub fire_count: u64,
    pub fail_count: u64,
    pub throttle_count: u64,
    pub avg_latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub trigger_id: TriggerId,
    pub name: String,
    pub condition: TriggerCondition,
    /// IMLPlan with `{{trigger.*}}` placeholders, instantiated on fire.
    pub plan_template: IMLPlan,
    #[serde(default)]
    pub priority: i32,
    pub state: TriggerState,
    #[serde(default)]
    pub min_interval_seconds: u64,
    #[serde(default)]
    pub max_fires_per_hour: u32,
    pub conflict_policy: ConflictPolicy,
    #[serde(default)]
    pub resource_lock: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u32,
    #[serde(default)]
    pub chain_depth: u32,
    #[serde(default)]
    pub health: TriggerHealth,
    #[serde(default)]
    pub last_fired_at: Option<i64>,
}

fn default_true() -> bool {
    true
}

fn default_max_chain_depth() -> u32 {
    5
}

impl TriggerDefinition {
    /// spec.md §3 invariant: `chain_depth ≤ max_chain_depth`.
    pub fn chain_depth_exceeded(&self) -> bool {
        self.chain_depth >= self.max_chain_depth
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.map(|exp| now_ms >= exp).unwrap_or(false)
    }

    /// Whether enough time has passed since the last fire to admit a new one.
    pub fn interval_elapsed(&self, now_ms: i64) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => (now_ms - last) >= (self.min_interval_seconds as i64 * 1000),
        }
    }

    pub fn can_fire(&self, now_ms: i64) -> bool {
        self.state.is_fire_ready() && !self.is_expired(now_ms) && self.interval_elapsed(now_ms)
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
