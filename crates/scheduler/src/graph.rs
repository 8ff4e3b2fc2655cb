// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency graph construction and queries (spec.md §4.3).

use crate::error::SchedulerError;
use iml_core::ids::ActionId;
use iml_core::plan::IMLPlan;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Directed graph over `(action.id, action.depends_on)` edges, re-checked
/// for acyclicity at construction time even though the Protocol Validator
/// already rejected cyclic plans (spec.md §4.3: "already done in 4.1 but
/// re-checked").
#[derive(Debug, Clone)]
pub struct PlanGraph {
    /// action -> the actions it depends on.
    predecessors: IndexMap<ActionId, IndexSet<ActionId>>,
    /// action -> the actions that depend on it.
    successors: IndexMap<ActionId, IndexSet<ActionId>>,
}

impl PlanGraph {
    pub fn build(plan: &IMLPlan) -> Result<Self, SchedulerError> {
        let mut predecessors: IndexMap<ActionId, IndexSet<ActionId>> = IndexMap::new();
        let mut successors: IndexMap<ActionId, IndexSet<ActionId>> = IndexMap::new();

        for action in &plan.actions {
            predecessors.entry(action.id.clone()).or_default();
            successors.entry(action.id.clone()).or_default();
        }
        for action in &plan.actions {
            for dep in &action.depends_on {
                if !predecessors.contains_key(dep) {
                    return Err(SchedulerError::UnknownAction(dep.to_string()));
                }
                predecessors.entry(action.id.clone()).or_default().insert(dep.clone());
                successors.entry(dep.clone()).or_default().insert(action.id.clone());
            }
        }

        let graph = Self { predecessors, successors };
        graph.check_acyclic()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> Result<(), SchedulerError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks: IndexMap<&ActionId, Mark> =
            self.predecessors.keys().map(|id| (id, Mark::Unvisited)).collect();

        fn visit<'a>(
            node: &'a ActionId,
            graph: &'a PlanGraph,
            marks: &mut IndexMap<&'a ActionId, Mark>,
            stack: &mut Vec<&'a ActionId>,
        ) -> Option<Vec<&'a ActionId>> {
            marks.insert(node, Mark::InProgress);
            stack.push(node);
            for dep in graph.predecessors.get(node).into_iter().flatten() {
                match marks.get(dep).copied().unwrap_or(Mark::Unvisited) {
                    Mark::InProgress => {
                        let start = stack.iter().position(|n| *n == dep).unwrap_or(0);
                        return Some(stack[start..].to_vec());
                    }
                    Mark::Unvisited => {
                        if let Some(cycle) = visit(dep, graph, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            stack.pop();
            marks.insert(node, Mark::Done);
            None
        }

        for id in self.predecessors.keys() {
            if marks[id] == Mark::Unvisited {
                let mut stack = Vec::new();
                if let Some(cycle) = visit(id, self, &mut marks, &mut stack) {
                    return Err(SchedulerError::DagCycle(
                        cycle.into_iter().map(|id| id.to_string()).collect(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn action_ids(&self) -> impl Iterator<Item = &ActionId> {
        self.predecessors.keys()
    }

    pub fn successors(&self, id: &ActionId) -> Vec<ActionId> {
        self.successors.get(id).map(|s| s.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn predecessors(&self, id: &ActionId) -> Vec<ActionId> {
        self.predecessors.get(id).map(|s| s.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn ancestors(&self, id: &ActionId) -> IndexSet<ActionId> {
        let mut seen = IndexSet::new();
        let mut stack: Vec<ActionId> = self.predecessors(id);
        while let Some(node) = stack.pop() {
            if seen.insert(node.clone()) {
                stack.extend(self.predecessors(&node));
            }
        }
        seen
    }

    pub fn descendants(&self, id: &ActionId) -> IndexSet<ActionId> {
        let mut seen = IndexSet::new();
        let mut stack: Vec<ActionId> = self.successors(id);
        while let Some(node) = stack.pop() {
            if seen.insert(node.clone()) {
                stack.extend(self.successors(&node));
            }
        }
        seen
    }

    /// Neither `a` is an ancestor of `b` nor vice versa.
    pub fn is_independent(&self, a: &ActionId, b: &ActionId) -> bool {
        a != b && !self.ancestors(a).contains(b) && !self.descendants(a).contains(b)
    }

    pub(crate) fn in_degree(&self, id: &ActionId) -> usize {
        self.predecessors.get(id).map(IndexSet::len).unwrap_or(0)
    }

    pub(crate) fn zero_in_degree(&self, done: &HashSet<ActionId>) -> Vec<ActionId> {
        let mut ready: Vec<ActionId> = self
            .predecessors
            .keys()
            .filter(|id| !done.contains(*id))
            .filter(|id| self.predecessors(*id).iter().all(|dep| done.contains(dep)))
            .cloned()
            .collect();
        ready.sort();
        ready
    }

    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predecessors.len()
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
