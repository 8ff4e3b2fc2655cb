// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable failure hints for `ActionState.alternatives` (spec.md
//! §4.12 step "CONTINUE"): a handful of substring checks over the error
//! text, plus a fallback-module suggestion when one exists.

use crate::registry::ModuleRegistry;
use iml_core::ModuleId;
use std::collections::HashMap;

pub fn suggest_alternatives(
    error_text: &str,
    module: &ModuleId,
    action: &str,
    fallback_chains: &HashMap<ModuleId, Vec<ModuleId>>,
    module_registry: &ModuleRegistry,
) -> Vec<String> {
    let lower = error_text.to_lowercase();
    let mut hints = Vec::new();

    if lower.contains("file not found") {
        hints.push("verify the file path exists and is spelled correctly".to_string());
    }
    if lower.contains("permission denied") {
        hints.push("the current permission profile may not allow this module/action".to_string());
    }
    if lower.contains("timeout") {
        hints.push("the module may be slow under load; consider raising retry.backoff_seconds".to_string());
    }
    if lower.contains("connection refused") {
        hints.push("the target service appears to be down or unreachable".to_string());
    }

    if let Some(chain) = fallback_chains.get(module) {
        for fallback in chain {
            let has_action =
                module_registry.manifest(fallback).is_some_and(|m| m.action(action).is_some());
            if has_action {
                hints.push(format!("module {fallback} supports {action} as a fallback"));
            }
        }
    }

    hints
}

#[cfg(test)]
#[path = "alternatives_tests.rs"]
mod tests;
