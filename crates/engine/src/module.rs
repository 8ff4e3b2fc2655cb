// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `BaseModule`: the capability-module contract (spec.md §4.16, §6
//! `BaseModule`). Concrete capability modules (filesystem, database,
//! os_exec, vision, ...) are out of scope for this daemon; this trait and
//! the test-only [`EchoModule`] below are what exercise it.

use crate::error::EngineError;
use async_trait::async_trait;
use iml_core::ModuleManifest;
use serde_json::Value;
use std::collections::HashMap;

#[async_trait]
pub trait BaseModule: Send + Sync {
    fn manifest(&self) -> &ModuleManifest;

    /// Runs one action. Implementations raise
    /// [`EngineError::ActionNotFound`] for an action absent from their
    /// manifest, [`EngineError::ActionExecutionError`] for any runtime
    /// failure.
    async fn execute(&self, action: &str, params: HashMap<String, Value>) -> Result<Value, EngineError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use iml_core::manifest::{ActionSpec, RiskLevel};
    use iml_core::ModuleId;

    /// Echoes its params back as the result. Used to exercise the
    /// executor's dispatch path without a real capability module.
    pub struct EchoModule {
        manifest: ModuleManifest,
    }

    impl EchoModule {
        pub fn new(module_id: &str) -> Self {
            let manifest = ModuleManifest {
                module_id: ModuleId::new(module_id),
                version: "1.0.0".to_string(),
                supported_platforms: Vec::new(),
                os_capabilities: Vec::new(),
                actions: vec![ActionSpec {
                    name: "echo".to_string(),
                    description: "returns its params unchanged".to_string(),
                    params_schema: serde_json::json!({}),
                    risk_level: RiskLevel::Low,
                    permission_required: false,
                    irreversible: false,
                }],
            };
            Self { manifest }
        }
    }

    #[async_trait]
    impl BaseModule for EchoModule {
        fn manifest(&self) -> &ModuleManifest {
            &self.manifest
        }

        async fn execute(&self, action: &str, params: HashMap<String, Value>) -> Result<Value, EngineError> {
            if action != "echo" {
                return Err(EngineError::ActionNotFound {
                    module: self.manifest.module_id.to_string(),
                    action: action.to_string(),
                });
            }
            Ok(Value::Object(params.into_iter().collect()))
        }
    }

    /// Always fails; used to exercise fallback chains and `on_error` paths.
    pub struct FailingModule {
        manifest: ModuleManifest,
    }

    impl FailingModule {
        pub fn new(module_id: &str, action_name: &str) -> Self {
            let manifest = ModuleManifest {
                module_id: ModuleId::new(module_id),
                version: "1.0.0".to_string(),
                supported_platforms: Vec::new(),
                os_capabilities: Vec::new(),
                actions: vec![ActionSpec {
                    name: action_name.to_string(),
                    description: "always fails".to_string(),
                    params_schema: serde_json::json!({}),
                    risk_level: RiskLevel::Low,
                    permission_required: false,
                    irreversible: false,
                }],
            };
            Self { manifest }
        }
    }

    #[async_trait]
    impl BaseModule for FailingModule {
        fn manifest(&self) -> &ModuleManifest {
            &self.manifest
        }

        async fn execute(&self, action: &str, _params: HashMap<String, Value>) -> Result<Value, EngineError> {
            Err(EngineError::ActionExecutionError {
                module: self.manifest.module_id.to_string(),
                action: action.to_string(),
                source: "simulated failure".to_string(),
            })
        }
    }

    /// Echoes back after sleeping for `delay`. Used to exercise group-level
    /// timeout and cancellation cascades, where the outcome needs to still
    /// be in flight when the group gives up on it.
    pub struct SlowModule {
        manifest: ModuleManifest,
        delay: std::time::Duration,
    }

    impl SlowModule {
        pub fn new(module_id: &str, delay: std::time::Duration) -> Self {
            let manifest = ModuleManifest {
                module_id: ModuleId::new(module_id),
                version: "1.0.0".to_string(),
                supported_platforms: Vec::new(),
                os_capabilities: Vec::new(),
                actions: vec![ActionSpec {
                    name: "echo".to_string(),
                    description: "echoes params back after a delay".to_string(),
                    params_schema: serde_json::json!({}),
                    risk_level: RiskLevel::Low,
                    permission_required: false,
                    irreversible: false,
                }],
            };
            Self { manifest, delay }
        }
    }

    #[async_trait]
    impl BaseModule for SlowModule {
        fn manifest(&self) -> &ModuleManifest {
            &self.manifest
        }

        async fn execute(&self, action: &str, params: HashMap<String, Value>) -> Result<Value, EngineError> {
            if action != "echo" {
                return Err(EngineError::ActionNotFound {
                    module: self.manifest.module_id.to_string(),
                    action: action.to_string(),
                });
            }
            tokio::time::sleep(self.delay).await;
            Ok(Value::Object(params.into_iter().collect()))
        }
    }
}
