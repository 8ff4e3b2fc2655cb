// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic plan validation (spec.md §4.1 "Validator").

use crate::error::ProtocolError;
use crate::template::RESULT_REF_PATTERN;
use iml_core::ids::ActionId;
use iml_core::plan::{ExecutionMode, IMLAction, IMLPlan};
use std::collections::{HashMap, HashSet};

pub fn validate(plan: &IMLPlan) -> Result<(), ProtocolError> {
    validate_unique_ids(plan)?;
    validate_dependencies_exist(plan)?;
    validate_no_self_dependency(plan)?;
    validate_no_cycles(plan)?;
    validate_template_references(plan)?;
    validate_rollback_no_cycles(plan)?;
    validate_mode_constraints(plan)?;
    Ok(())
}

fn validate_unique_ids(plan: &IMLPlan) -> Result<(), ProtocolError> {
    let mut seen = HashSet::new();
    for action in &plan.actions {
        if !seen.insert(&action.id) {
            return Err(ProtocolError::ValidationError(format!(
                "duplicate action id {:?}",
                action.id
            )));
        }
    }
    Ok(())
}

fn validate_dependencies_exist(plan: &IMLPlan) -> Result<(), ProtocolError> {
    let ids: HashSet<&ActionId> = plan.action_ids().collect();
    for action in &plan.actions {
        for dep in &action.depends_on {
            if !ids.contains(dep) {
                return Err(ProtocolError::ValidationError(format!(
                    "action {:?} depends on unknown action {:?}",
                    action.id, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_no_self_dependency(plan: &IMLPlan) -> Result<(), ProtocolError> {
    for action in &plan.actions {
        if action.depends_on_self() {
            return Err(ProtocolError::ValidationError(format!(
                "action {:?} depends on itself",
                action.id
            )));
        }
    }
    Ok(())
}

/// DFS-based cycle detection over `depends_on` edges, reporting the cycle's
/// node list on failure (spec.md §4.1).
fn validate_no_cycles(plan: &IMLPlan) -> Result<(), ProtocolError> {
    let edges: HashMap<&ActionId, &Vec<ActionId>> =
        plan.actions.iter().map(|a| (&a.id, &a.depends_on)).collect();
    let mut marks: HashMap<&ActionId, MarkLocal> =
        plan.actions.iter().map(|a| (&a.id, MarkLocal::Unvisited)).collect();

    for action in &plan.actions {
        if marks[&action.id] == MarkLocal::Unvisited {
            let mut stack = Vec::new();
            if let Some(cycle) = dfs_visit(&action.id, &edges, &mut marks, &mut stack) {
                return Err(ProtocolError::DagCycle(
                    cycle.into_iter().map(|id| id.to_string()).collect(),
                ));
            }
        }
    }
    Ok(())
}

fn dfs_visit<'a>(
    node: &'a ActionId,
    edges: &HashMap<&'a ActionId, &'a Vec<ActionId>>,
    marks: &mut HashMap<&'a ActionId, MarkLocal>,
    stack: &mut Vec<&'a ActionId>,
) -> Option<Vec<&'a ActionId>> {
    marks.insert(node, MarkLocal::InProgress);
    stack.push(node);

    if let Some(deps) = edges.get(node) {
        for dep in deps.iter() {
            match marks.get(dep).copied().unwrap_or(MarkLocal::Unvisited) {
                MarkLocal::InProgress => {
                    let start = stack.iter().position(|n| *n == dep).unwrap_or(0);
                    return Some(stack[start..].to_vec());
                }
                MarkLocal::Unvisited => {
                    if let Some(cycle) = dfs_visit(dep, edges, marks, stack) {
                        return Some(cycle);
                    }
                }
                MarkLocal::Done => {}
            }
        }
    }

    stack.pop();
    marks.insert(node, MarkLocal::Done);
    None
}

#[derive(Clone, Copy, PartialEq)]
enum MarkLocal {
    Unvisited,
    InProgress,
    Done,
}

fn validate_template_references(plan: &IMLPlan) -> Result<(), ProtocolError> {
    let ids: HashSet<&str> = plan.actions.iter().map(|a| a.id.as_str()).collect();
    for action in &plan.actions {
        for value in action.params.values() {
            check_value_for_result_refs(value, &ids)?;
        }
    }
    Ok(())
}

fn check_value_for_result_refs(
    value: &serde_json::Value,
    ids: &HashSet<&str>,
) -> Result<(), ProtocolError> {
    match value {
        serde_json::Value::String(s) => {
            for caps in RESULT_REF_PATTERN.captures_iter(s) {
                let referenced = &caps[1];
                if !ids.contains(referenced) {
                    return Err(ProtocolError::UnknownTemplateReference(referenced.to_string()));
                }
            }
            Ok(())
        }
        serde_json::Value::Array(items) => {
            for item in items {
                check_value_for_result_refs(item, ids)?;
            }
            Ok(())
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                check_value_for_result_refs(v, ids)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Rollback chains form no cycles: "action-A rolls back to action-B rolls
/// back to action-A" is fatal (spec.md §4.1).
fn validate_rollback_no_cycles(plan: &IMLPlan) -> Result<(), ProtocolError> {
    for action in &plan.actions {
        let mut seen = HashSet::new();
        let mut current: Option<&IMLAction> = Some(action);
        seen.insert(action.id.clone());
        while let Some(a) = current {
            match &a.rollback {
                Some(rb) => {
                    if !seen.insert(rb.id.clone()) {
                        return Err(ProtocolError::ValidationError(format!(
                            "rollback cycle starting at action {:?}",
                            action.id
                        )));
                    }
                    current = Some(rb.as_ref());
                }
                None => current = None,
            }
        }
    }
    Ok(())
}

fn validate_mode_constraints(plan: &IMLPlan) -> Result<(), ProtocolError> {
    if plan.execution_mode == ExecutionMode::Reactive {
        let has_trigger_binding = plan.metadata.contains_key("trigger_id")
            || plan.session_id.is_some();
        if !has_trigger_binding {
            return Err(ProtocolError::ValidationError(
                "REACTIVE plans require at least one trigger binding".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
