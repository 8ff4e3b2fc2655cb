// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Context Propagator (spec.md §4.15): a thin `plan_id ->
//! trigger_context` map the Template Resolver consults for the
//! `{{trigger.*}}` scope. Single-writer lock; `get` takes only a read lock,
//! so readers never contend with each other.

use iml_core::PlanId;
use iml_protocol::template::TriggerScope;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct SessionContextPropagator {
    bindings: RwLock<HashMap<PlanId, TriggerScope>>,
}

impl SessionContextPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, plan_id: PlanId, context: TriggerScope) {
        self.bindings.write().insert(plan_id, context);
    }

    pub fn get(&self, plan_id: &PlanId) -> Option<TriggerScope> {
        self.bindings.read().get(plan_id).cloned()
    }

    pub fn unbind(&self, plan_id: &PlanId) {
        self.bindings.write().remove(plan_id);
    }

    pub fn active_count(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn active_plan_ids(&self) -> Vec<PlanId> {
        self.bindings.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
