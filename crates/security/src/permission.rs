// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission Guard (spec.md §4.6).

use crate::error::SecurityError;
use crate::glob::glob_matches;
use iml_core::permission::{PermissionProfile, ProfileName};
use iml_core::plan::IMLPlan;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Param keys known to carry filesystem/resource paths that must stay under
/// a sandbox root (spec.md §4.6 step 3).
const PATH_PARAM_KEYS: &[&str] =
    &["path", "source", "destination", "output_path", "database", "image_path"];

pub struct PermissionGuard {
    pub profile: PermissionProfile,
    pub explicit_approval_actions: HashSet<String>,
    pub sandbox_roots: Vec<PathBuf>,
}

impl PermissionGuard {
    pub fn new(profile: PermissionProfile, sandbox_roots: Vec<PathBuf>) -> Self {
        Self { profile, explicit_approval_actions: HashSet::new(), sandbox_roots }
    }

    fn is_allowed(&self, key: &str) -> bool {
        let allowed = self.profile.allowed_patterns.iter().any(|p| glob_matches(p, key));
        let denied = self.profile.denied_patterns.iter().any(|p| glob_matches(p, key));
        // "Deny patterns take precedence over allow" (spec.md §4.6).
        allowed && !denied
    }

    /// Step 1: plan preflight.
    pub fn check_plan_preflight(&self, plan: &IMLPlan) -> Result<(), SecurityError> {
        if plan.actions.len() > self.profile.max_plan_actions {
            return Err(SecurityError::PermissionDenied {
                module: String::new(),
                action: String::new(),
                profile: self.profile.name.to_string(),
            });
        }
        for action in &plan.actions {
            let key = format!("{}.{}", action.module, action.action);
            if !self.is_allowed(&key) {
                return Err(SecurityError::PermissionDenied {
                    module: action.module.to_string(),
                    action: action.action.clone(),
                    profile: self.profile.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Step 2: per-action pre-dispatch check.
    pub fn check_action(&self, module: &str, action: &str, requires_approval: bool) -> Result<(), SecurityError> {
        let key = format!("{module}.{action}");
        if !self.is_allowed(&key) {
            return Err(SecurityError::PermissionDenied {
                module: module.to_string(),
                action: action.to_string(),
                profile: self.profile.name.to_string(),
            });
        }
        let explicit = self.explicit_approval_actions.contains(&key);
        if explicit || requires_approval {
            let bypass = self.profile.name == ProfileName::Unrestricted && self.profile.allow_approval_bypass;
            if !bypass {
                return Err(SecurityError::ApprovalRequired {
                    module: module.to_string(),
                    action: action.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Steps 3/4: sandbox check, run both pre- and post-resolution over
    /// whatever params are given (template-valued strings are skipped by
    /// the caller running this pre-resolution; post-resolution, the now
    /// fully-resolved strings are checked too).
    pub fn check_sandbox(&self, params: &std::collections::HashMap<String, Value>) -> Result<(), SecurityError> {
        if self.sandbox_roots.is_empty() {
            return Ok(());
        }
        for key in PATH_PARAM_KEYS {
            if let Some(Value::String(raw)) = params.get(*key) {
                if raw.contains("{{") {
                    continue; // deferred until the Template Resolver runs
                }
                if !self.is_under_sandbox(raw) {
                    return Err(SecurityError::SandboxViolation(raw.clone()));
                }
            }
        }
        Ok(())
    }

    fn is_under_sandbox(&self, raw: &str) -> bool {
        let candidate = normalize(Path::new(raw));
        self.sandbox_roots.iter().any(|root| {
            let root = normalize(root);
            candidate.starts_with(&root)
        })
    }
}

/// Lexically normalizes `..`/`.` components without touching the
/// filesystem (spec.md §4.6: "after normalising symlinks / `..`" — actual
/// symlink resolution is the caller's responsibility via `canonicalize`
/// when the path exists; this lexical pass covers the common traversal
/// case even for paths that don't exist yet).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
