// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource Manager (spec.md §4.11): bounds concurrent in-flight dispatches
//! per module via a counting semaphore.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct ModuleStatus {
    pub limit: usize,
    pub in_use: usize,
    pub available: usize,
}

/// Held for the lifetime of one dispatch; releases its slot on drop.
pub struct ResourceGuard {
    _permit: OwnedSemaphorePermit,
}

pub struct ResourceManager {
    default_limit: usize,
    overrides: HashMap<String, usize>,
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ResourceManager {
    pub fn new(default_limit: usize) -> Self {
        Self { default_limit, overrides: HashMap::new(), semaphores: Mutex::new(HashMap::new()) }
    }

    pub fn with_override(mut self, module_id: impl Into<String>, limit: usize) -> Self {
        self.overrides.insert(module_id.into(), limit);
        self
    }

    fn limit_for(&self, module_id: &str) -> usize {
        self.overrides.get(module_id).copied().unwrap_or(self.default_limit)
    }

    fn semaphore_for(&self, module_id: &str) -> Arc<Semaphore> {
        self.semaphores
            .lock()
            .entry(module_id.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.limit_for(module_id))))
            .clone()
    }

    /// Waits for a free slot under `module_id` and returns a guard that
    /// releases it on drop.
    pub async fn acquire(&self, module_id: &str) -> ResourceGuard {
        let semaphore = self.semaphore_for(module_id);
        // The semaphore is only ever closed by being dropped wholesale
        // along with the ResourceManager, never explicitly.
        #[allow(clippy::expect_used)]
        let permit = semaphore.acquire_owned().await.expect("resource semaphore is never closed");
        ResourceGuard { _permit: permit }
    }

    pub fn status(&self) -> HashMap<String, ModuleStatus> {
        let guard = self.semaphores.lock();
        guard
            .iter()
            .map(|(module_id, sem)| {
                let limit = self.limit_for(module_id);
                let available = sem.available_permits();
                (module_id.clone(), ModuleStatus { limit, in_use: limit.saturating_sub(available), available })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
