// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node Registry (spec.md §4.16): decouples the executor from module
//! dispatch. Only the local node is mandated; remote nodes are out of
//! scope.

use crate::error::EngineError;
use crate::registry::ModuleRegistry;
use async_trait::async_trait;
use iml_core::ModuleId;
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// `target_node` resolves to this name when a plan action leaves it unset.
pub const LOCAL_NODE: &str = "local";

#[async_trait]
pub trait BaseNode: Send + Sync {
    fn node_id(&self) -> &str;

    /// `cancel` is threaded through per SPEC_FULL.md §C.5; implementations
    /// may ignore it.
    async fn execute_action(
        &self,
        module_id: &ModuleId,
        action: &str,
        params: HashMap<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, EngineError>;

    fn is_available(&self) -> bool;
}

/// Delegates to a [`ModuleRegistry`] in-process.
pub struct LocalNode {
    registry: ModuleRegistry,
}

impl LocalNode {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl BaseNode for LocalNode {
    fn node_id(&self) -> &str {
        LOCAL_NODE
    }

    async fn execute_action(
        &self,
        module_id: &ModuleId,
        action: &str,
        params: HashMap<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<Value, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::NodeUnavailable(LOCAL_NODE.to_string()));
        }
        self.registry.execute(module_id, action, params).await
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Maps `target_node` strings to [`BaseNode`]s. `None`/`"local"` always
/// resolves to the local node, even if a caller never registered it under
/// that name explicitly.
pub struct NodeRegistry {
    local: std::sync::Arc<dyn BaseNode>,
    remote: HashMap<String, std::sync::Arc<dyn BaseNode>>,
}

impl NodeRegistry {
    pub fn new(local: LocalNode) -> Self {
        Self { local: std::sync::Arc::new(local), remote: HashMap::new() }
    }

    /// Remote nodes are out of scope for dispatch but the map exists so the
    /// abstraction is exercised; registering one does not make it reachable
    /// by anything beyond `get`.
    pub fn register_remote(&mut self, node: std::sync::Arc<dyn BaseNode>) {
        self.remote.insert(node.node_id().to_string(), node);
    }

    pub fn get(&self, target_node: Option<&str>) -> Result<std::sync::Arc<dyn BaseNode>, EngineError> {
        match target_node {
            None | Some(LOCAL_NODE) => Ok(self.local.clone()),
            Some(other) => self.remote.get(other).cloned().ok_or_else(|| EngineError::NodeNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
