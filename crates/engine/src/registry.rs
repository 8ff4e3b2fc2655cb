// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module Registry (spec.md §9 "Module registry late-binding";
//! SPEC_FULL.md §C.1/§C.2): a builder-frozen map of module id to
//! [`BaseModule`].

use crate::error::EngineError;
use crate::module::BaseModule;
use iml_core::{ModuleId, ModuleManifest, ModuleStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Accumulates modules before the registry is frozen. Once `build()` is
/// called, no module can be added, removed, or replaced — "once started,
/// the registry is frozen" (spec.md §9).
#[derive(Default)]
pub struct ModuleRegistryBuilder {
    modules: HashMap<ModuleId, ModuleEntry>,
}

enum ModuleEntry {
    Loaded(Arc<dyn BaseModule>),
    PlatformIncompatible(ModuleManifest),
    LoadFailed { reason: String },
}

impl ModuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, module: Arc<dyn BaseModule>) -> Self {
        let id = module.manifest().module_id.clone();
        self.modules.insert(id, ModuleEntry::Loaded(module));
        self
    }

    /// Registers a module that was skipped because its manifest declares
    /// platforms it cannot run under here (spec.md §9).
    pub fn register_platform_incompatible(mut self, manifest: ModuleManifest) -> Self {
        self.modules.insert(manifest.module_id.clone(), ModuleEntry::PlatformIncompatible(manifest));
        self
    }

    /// Registers a module slot that failed to load, keeping its id visible
    /// in status reports rather than silently dropping it.
    pub fn register_load_failed(mut self, module_id: ModuleId, reason: impl Into<String>) -> Self {
        self.modules.insert(module_id, ModuleEntry::LoadFailed { reason: reason.into() });
        self
    }

    pub fn build(self) -> ModuleRegistry {
        ModuleRegistry { modules: Arc::new(self.modules) }
    }
}

/// Frozen after construction: lookups never mutate it.
#[derive(Clone)]
pub struct ModuleRegistry {
    modules: Arc<HashMap<ModuleId, ModuleEntry>>,
}

impl ModuleRegistry {
    pub fn get(&self, module_id: &ModuleId) -> Result<Arc<dyn BaseModule>, EngineError> {
        match self.modules.get(module_id) {
            Some(ModuleEntry::Loaded(module)) => Ok(module.clone()),
            Some(ModuleEntry::PlatformIncompatible(_)) => {
                Err(EngineError::ModuleLoadError(module_id.to_string(), "platform incompatible".to_string()))
            }
            Some(ModuleEntry::LoadFailed { reason, .. }) => {
                Err(EngineError::ModuleLoadError(module_id.to_string(), reason.clone()))
            }
            None => Err(EngineError::ModuleNotFound(module_id.to_string())),
        }
    }

    pub async fn execute(
        &self,
        module_id: &ModuleId,
        action: &str,
        params: HashMap<String, Value>,
    ) -> Result<Value, EngineError> {
        self.get(module_id)?.execute(action, params).await
    }

    pub fn manifest(&self, module_id: &ModuleId) -> Option<ModuleManifest> {
        match self.modules.get(module_id)? {
            ModuleEntry::Loaded(module) => Some(module.manifest().clone()),
            ModuleEntry::PlatformIncompatible(manifest) => Some(manifest.clone()),
            ModuleEntry::LoadFailed { .. } => None,
        }
    }

    /// Registry introspection (SPEC_FULL.md §C.1).
    pub fn status_report(&self) -> HashMap<ModuleId, ModuleStatus> {
        self.modules
            .iter()
            .map(|(id, entry)| {
                let status = match entry {
                    ModuleEntry::Loaded(_) => ModuleStatus::Active,
                    ModuleEntry::PlatformIncompatible(_) => ModuleStatus::PlatformIncompatible,
                    ModuleEntry::LoadFailed { reason, .. } => ModuleStatus::LoadFailed(reason.clone()),
                };
                (id.clone(), status)
            })
            .collect()
    }

    pub fn module_ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.keys()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
