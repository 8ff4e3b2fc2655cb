// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution wave emission (spec.md §4.3).

use crate::error::SchedulerError;
use crate::graph::PlanGraph;
use iml_core::ids::ActionId;
use iml_core::plan::ExecutionMode;
use std::collections::HashSet;

/// One batch of actions the Executor may dispatch concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionWave {
    pub actions: Vec<ActionId>,
    pub is_final: bool,
}

/// Emits the ordered list of waves for a plan's graph, per spec.md §4.3:
///
/// - SEQUENTIAL: one wave per action, in topological order.
/// - PARALLEL / REACTIVE: Kahn's algorithm — each wave is every
///   currently-zero-in-degree action (sorted by id for determinism),
///   removed, repeated.
pub fn emit_waves(graph: &PlanGraph, mode: ExecutionMode) -> Result<Vec<ExecutionWave>, SchedulerError> {
    match mode {
        ExecutionMode::Sequential => emit_sequential(graph),
        ExecutionMode::Parallel | ExecutionMode::Reactive => emit_parallel(graph),
    }
}

fn emit_sequential(graph: &PlanGraph) -> Result<Vec<ExecutionWave>, SchedulerError> {
    let parallel_waves = emit_parallel(graph)?;
    let mut waves = Vec::new();
    for wave in parallel_waves {
        for action in wave.actions {
            waves.push(ExecutionWave { actions: vec![action], is_final: false });
        }
    }
    if let Some(last) = waves.last_mut() {
        last.is_final = true;
    }
    Ok(waves)
}

fn emit_parallel(graph: &PlanGraph) -> Result<Vec<ExecutionWave>, SchedulerError> {
    let mut waves = Vec::new();
    let mut done: HashSet<ActionId> = HashSet::new();

    while done.len() < graph.len() {
        let ready = graph.zero_in_degree(&done);
        if ready.is_empty() {
            // Acyclicity is already guaranteed by PlanGraph::build; an empty
            // ready set with actions remaining would mean a bug in the
            // in-degree bookkeeping above, not a cyclic plan.
            return Err(SchedulerError::UnknownAction(
                "scheduler deadlocked with actions remaining".to_string(),
            ));
        }
        for id in &ready {
            done.insert(id.clone());
        }
        waves.push(ExecutionWave { actions: ready, is_final: false });
    }

    if let Some(last) = waves.last_mut() {
        last.is_final = true;
    }
    Ok(waves)
}

#[cfg(test)]
#[path = "waves_tests.rs"]
mod tests;
