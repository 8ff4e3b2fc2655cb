use super::*;
use iml_core::manifest::{ActionSpec, RiskLevel};
use iml_core::plan::{ExecutionMode, IMLAction, IMLPlan};
use iml_core::trigger::{ConflictPolicy, TriggerCondition, TriggerHealth, TriggerState};
use iml_core::{ActionId, FakeClock, ModuleId, ModuleManifest, PermissionProfile, PlanId};
use iml_engine::{BaseModule, ExecutorConfig, LocalNode, ModuleRegistryBuilder, NodeRegistry, PlanExecutor};
use iml_protocol::template::MemoryStore;
use iml_security::{ApprovalGate, PermissionGuard, RateLimiter, ResourceManager, ScannerConfig, ScannerPipeline};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

struct NullMemory;
impl MemoryStore for NullMemory {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

struct EchoModule {
    manifest: ModuleManifest,
}

impl EchoModule {
    fn new() -> Self {
        Self {
            manifest: ModuleManifest {
                module_id: ModuleId::new("echo"),
                version: "1.0.0".to_string(),
                supported_platforms: Vec::new(),
                os_capabilities: Vec::new(),
                actions: vec![ActionSpec {
                    name: "echo".to_string(),
                    description: "echoes params back".to_string(),
                    params_schema: serde_json::json!({}),
                    risk_level: RiskLevel::Low,
                    permission_required: false,
                    irreversible: false,
                }],
            },
        }
    }
}

#[async_trait::async_trait]
impl BaseModule for EchoModule {
    fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    async fn execute(&self, _action: &str, params: HashMap<String, Value>) -> Result<Value, iml_engine::EngineError> {
        Ok(Value::Object(params.into_iter().collect()))
    }
}

async fn build_daemon() -> (Arc<TriggerDaemon<FakeClock>>, Arc<TriggerStore>) {
    let store = Arc::new(TriggerStore::connect("sqlite::memory:").await.unwrap());
    let modules = ModuleRegistryBuilder::new().register(Arc::new(EchoModule::new())).build();
    let state_store = Arc::new(iml_storage::StateStore::connect("sqlite::memory:").await.unwrap());
    let node_registry = NodeRegistry::new(LocalNode::new(modules.clone()));
    let permission_guard = PermissionGuard::new(PermissionProfile::unrestricted(), Vec::<PathBuf>::new());
    let session = Arc::new(SessionContextPropagator::new());
    let clock = FakeClock::new();

    let executor = Arc::new(PlanExecutor::new(
        state_store,
        Arc::new(iml_bus::NullEventBus),
        permission_guard,
        ScannerPipeline::new(ScannerConfig::default()),
        RateLimiter::new(),
        ResourceManager::new(10),
        Arc::new(ApprovalGate::new()),
        node_registry,
        modules,
        Arc::new(NullMemory),
        session.clone(),
        clock.clone(),
        ExecutorConfig::default(),
    ));

    let daemon = TriggerDaemon::new(store.clone(), executor, session, Arc::new(iml_bus::NullEventBus), clock);
    (daemon, store)
}

fn echo_plan(id: &str) -> IMLPlan {
    IMLPlan::builder()
        .plan_id(PlanId::from(id))
        .execution_mode(ExecutionMode::Sequential)
        .actions(vec![IMLAction::builder()
            .id(ActionId::from("a1"))
            .module(ModuleId::new("echo"))
            .action("echo")
            .build()])
        .build()
}

fn definition(trigger_id: &str) -> TriggerDefinition {
    TriggerDefinition {
        trigger_id: TriggerId::new(trigger_id),
        name: trigger_id.to_string(),
        condition: TriggerCondition::Temporal { interval_seconds: Some(60), run_at: None, schedule: None },
        plan_template: echo_plan("template"),
        priority: 0,
        state: TriggerState::Registered,
        min_interval_seconds: 0,
        max_fires_per_hour: 0,
        conflict_policy: ConflictPolicy::Queue,
        resource_lock: None,
        enabled: true,
        expires_at: None,
        max_chain_depth: 5,
        chain_depth: 0,
        health: TriggerHealth::default(),
        last_fired_at: None,
    }
}

async fn wait_until_state(store: &TriggerStore, trigger_id: &TriggerId, want: TriggerState) -> TriggerDefinition {
    for _ in 0..200 {
        if let Some(def) = store.get(trigger_id).await.unwrap() {
            if def.state == want {
                return def;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("trigger {trigger_id} never reached state {want}");
}

async fn wait_until_throttled(store: &TriggerStore, trigger_id: &TriggerId) -> TriggerDefinition {
    for _ in 0..200 {
        if let Some(def) = store.get(trigger_id).await.unwrap() {
            if def.health.throttle_count >= 1 {
                return def;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("trigger {trigger_id} was never throttled");
}

#[tokio::test]
async fn register_and_activate_moves_trigger_to_active() {
    let (daemon, store) = build_daemon().await;
    let def = definition("t1");
    daemon.register(def).await.unwrap();
    daemon.activate(&TriggerId::new("t1")).await.unwrap();

    let stored = store.get(&TriggerId::new("t1")).await.unwrap().unwrap();
    assert_eq!(stored.state, TriggerState::Active);

    daemon.deactivate(&TriggerId::new("t1")).await.unwrap();
    let stored = store.get(&TriggerId::new("t1")).await.unwrap().unwrap();
    assert_eq!(stored.state, TriggerState::Inactive);
}

#[tokio::test]
async fn delete_removes_trigger_and_stops_its_watcher() {
    let (daemon, store) = build_daemon().await;
    daemon.register(definition("t2")).await.unwrap();
    daemon.activate(&TriggerId::new("t2")).await.unwrap();

    daemon.delete(&TriggerId::new("t2")).await.unwrap();
    assert!(store.get(&TriggerId::new("t2")).await.unwrap().is_none());
}

#[tokio::test]
async fn a_manual_fire_dispatches_a_plan_and_returns_to_watching() {
    let (daemon, store) = build_daemon().await;
    let mut def = definition("t3");
    def.state = TriggerState::Active;
    daemon.register(def).await.unwrap();
    daemon.spawn_event_loop();

    daemon
        .tx
        .send(FireEvent {
            trigger_id: TriggerId::new("t3"),
            event_type: "manual".to_string(),
            payload: serde_json::Map::new(),
            watcher_error: None,
        })
        .unwrap();

    let stored = wait_until_state(&store, &TriggerId::new("t3"), TriggerState::Watching).await;
    assert_eq!(stored.health.fire_count, 1);
    assert_eq!(stored.health.fail_count, 0);
    assert!(stored.last_fired_at.is_some());
}

#[tokio::test]
async fn throttling_rejects_a_fire_within_the_minimum_interval() {
    let (daemon, store) = build_daemon().await;
    let mut def = definition("t4");
    def.state = TriggerState::Active;
    def.min_interval_seconds = 3600;
    def.last_fired_at = Some(1_000_000);
    daemon.register(def).await.unwrap();
    daemon.spawn_event_loop();

    daemon
        .tx
        .send(FireEvent { trigger_id: TriggerId::new("t4"), event_type: "x".to_string(), payload: serde_json::Map::new(), watcher_error: None })
        .unwrap();

    let stored = wait_until_throttled(&store, &TriggerId::new("t4")).await;
    assert_eq!(stored.state, TriggerState::Active);
    assert_eq!(stored.health.fire_count, 0);
}

#[tokio::test]
async fn chain_depth_exceeded_is_rejected_without_dispatching() {
    let (daemon, store) = build_daemon().await;
    let mut def = definition("t5");
    def.state = TriggerState::Active;
    def.chain_depth = 5;
    def.max_chain_depth = 5;
    daemon.register(def).await.unwrap();
    daemon.spawn_event_loop();

    daemon
        .tx
        .send(FireEvent { trigger_id: TriggerId::new("t5"), event_type: "x".to_string(), payload: serde_json::Map::new(), watcher_error: None })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stored = store.get(&TriggerId::new("t5")).await.unwrap().unwrap();
    assert_eq!(stored.health.fire_count, 0);
    assert_eq!(stored.state, TriggerState::Active);
}

#[tokio::test]
async fn watcher_error_moves_trigger_to_failed() {
    let (daemon, store) = build_daemon().await;
    let mut def = definition("t6");
    def.state = TriggerState::Active;
    daemon.register(def).await.unwrap();
    daemon.spawn_event_loop();

    daemon
        .tx
        .send(FireEvent {
            trigger_id: TriggerId::new("t6"),
            event_type: "x".to_string(),
            payload: serde_json::Map::new(),
            watcher_error: Some("stat failed".to_string()),
        })
        .unwrap();

    let stored = wait_until_state(&store, &TriggerId::new("t6"), TriggerState::Failed).await;
    assert_eq!(stored.health.last_error.as_deref(), Some("stat failed"));
}
