// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission profiles (spec.md §3 "PermissionProfile", §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileName {
    Readonly,
    LocalWorker,
    PowerUser,
    Unrestricted,
}

crate::simple_display! {
    ProfileName {
        Readonly => "READONLY",
        LocalWorker => "LOCAL_WORKER",
        PowerUser => "POWER_USER",
        Unrestricted => "UNRESTRICTED",
    }
}

/// Immutable, selected at daemon start (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionProfile {
    pub name: ProfileName,
    pub allowed_patterns: Vec<String>,
    pub denied_patterns: Vec<String>,
    pub max_plan_actions: usize,
    pub allow_env_templates: bool,
    pub allow_approval_bypass: bool,
}

impl PermissionProfile {
    pub fn readonly() -> Self {
        Self {
            name: ProfileName::Readonly,
            allowed_patterns: vec!["filesystem.read_*".to_string(), "*.get_*".to_string()],
            denied_patterns: vec![],
            max_plan_actions: 20,
            allow_env_templates: false,
            allow_approval_bypass: false,
        }
    }

    pub fn local_worker() -> Self {
        Self {
            name: ProfileName::LocalWorker,
            allowed_patterns: vec!["*.*".to_string()],
            denied_patterns: vec!["os_exec.*".to_string()],
            max_plan_actions: 50,
            allow_env_templates: true,
            allow_approval_bypass: false,
        }
    }

    pub fn power_user() -> Self {
        Self {
            name: ProfileName::PowerUser,
            allowed_patterns: vec!["*.*".to_string()],
            denied_patterns: vec![],
            max_plan_actions: 200,
            allow_env_templates: true,
            allow_approval_bypass: false,
        }
    }

    pub fn unrestricted() -> Self {
        Self {
            name: ProfileName::Unrestricted,
            allowed_patterns: vec!["*.*".to_string()],
            denied_patterns: vec![],
            max_plan_actions: usize::MAX,
            allow_env_templates: true,
            allow_approval_bypass: true,
        }
    }
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
