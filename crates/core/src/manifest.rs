// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module manifests (spec.md §3 "ModuleManifest", §6 "get_manifest").

use crate::ids::ModuleId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-schema for the action's params, used by the Protocol Validator
    /// (spec.md §4.1 step 3) when a module is registered at parse time.
    pub params_schema: Value,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub permission_required: bool,
    #[serde(default)]
    pub irreversible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub module_id: ModuleId,
    /// PEP-440-style version specifier, per spec.md §3.
    pub version: String,
    #[serde(default)]
    pub supported_platforms: Vec<String>,
    #[serde(default)]
    pub os_capabilities: Vec<String>,
    pub actions: Vec<ActionSpec>,
}

impl ModuleManifest {
    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn supports_platform(&self, platform: &str) -> bool {
        self.supported_platforms.is_empty()
            || self.supported_platforms.iter().any(|p| p == platform)
    }
}

/// Registry introspection (SPEC_FULL.md §C.1): distinguishes
/// platform-incompatible modules from ones that failed to load, per the
/// "Module registry late-binding" design note (spec.md §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleStatus {
    Active,
    PlatformIncompatible,
    LoadFailed(String),
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
