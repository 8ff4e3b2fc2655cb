use super::*;
use crate::error::EngineError;
use crate::module::test_support::{EchoModule, FailingModule, SlowModule};
use crate::module::BaseModule;
use crate::node::{LocalNode, NodeRegistry};
use crate::plan_executor::ExecutorConfig;
use crate::registry::{ModuleRegistry, ModuleRegistryBuilder};
use crate::session::SessionContextPropagator;
use async_trait::async_trait;
use iml_bus::NullEventBus;
use iml_core::manifest::{ActionSpec, RiskLevel};
use iml_core::plan::{ExecutionMode, IMLAction, IMLPlan, OnError};
use iml_core::state::PlanStatus;
use iml_core::{ActionId, FakeClock, ModuleId, ModuleManifest, PermissionProfile, PlanId};
use iml_protocol::template::MemoryStore;
use iml_security::{ApprovalGate, PermissionGuard, RateLimiter, ResourceManager, ScannerConfig, ScannerPipeline};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

struct NullMemory;

impl MemoryStore for NullMemory {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Counts how many calls are in flight at once, used to check
/// `max_concurrent` is actually honoured rather than just documented.
struct TrackingModule {
    manifest: ModuleManifest,
    delay: Duration,
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl TrackingModule {
    fn new(module_id: &str, delay: Duration, current: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Self {
        let manifest = ModuleManifest {
            module_id: ModuleId::new(module_id),
            version: "1.0.0".to_string(),
            supported_platforms: Vec::new(),
            os_capabilities: Vec::new(),
            actions: vec![ActionSpec {
                name: "echo".to_string(),
                description: "tracks concurrent dispatch".to_string(),
                params_schema: serde_json::json!({}),
                risk_level: RiskLevel::Low,
                permission_required: false,
                irreversible: false,
            }],
        };
        Self { manifest, delay, current, peak }
    }
}

#[async_trait]
impl BaseModule for TrackingModule {
    fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    async fn execute(&self, _action: &str, params: HashMap<String, Value>) -> Result<Value, EngineError> {
        let in_flight = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(Value::Object(params.into_iter().collect()))
    }
}

fn echo_action(id: &str, module: &str) -> IMLAction {
    IMLAction::builder().id(ActionId::from(id)).module(ModuleId::new(module)).action("echo").build()
}

fn failing_action(id: &str) -> IMLAction {
    IMLAction::builder()
        .id(ActionId::from(id))
        .module(ModuleId::new("fail"))
        .action("boom")
        .on_error(OnError::Halt)
        .build()
}

fn plan(id: &str, actions: Vec<IMLAction>) -> IMLPlan {
    IMLPlan::builder().plan_id(PlanId::from(id)).execution_mode(ExecutionMode::Sequential).actions(actions).build()
}

async fn build_executor(module_registry: ModuleRegistry) -> PlanExecutor<FakeClock> {
    let state_store = Arc::new(iml_storage::StateStore::connect("sqlite::memory:").await.unwrap());
    let node_registry = NodeRegistry::new(LocalNode::new(module_registry.clone()));
    let permission_guard = PermissionGuard::new(PermissionProfile::unrestricted(), Vec::<PathBuf>::new());

    PlanExecutor::new(
        state_store,
        Arc::new(NullEventBus),
        permission_guard,
        ScannerPipeline::new(ScannerConfig::default()),
        RateLimiter::new(),
        ResourceManager::new(10),
        Arc::new(ApprovalGate::new()),
        node_registry,
        module_registry,
        Arc::new(NullMemory),
        Arc::new(SessionContextPropagator::new()),
        FakeClock::new(),
        ExecutorConfig::default(),
    )
}

#[tokio::test]
async fn all_plans_completing_is_group_completed() {
    let modules = ModuleRegistryBuilder::new().register(Arc::new(EchoModule::new("echo"))).build();
    let executor = Arc::new(build_executor(modules).await);
    let group = PlanGroupExecutor::new(executor, 3, Duration::from_secs(5));

    let plans = vec![
        plan("p1", vec![echo_action("a1", "echo")]),
        plan("p2", vec![echo_action("a1", "echo")]),
        plan("p3", vec![echo_action("a1", "echo")]),
    ];

    let result = group.run(plans, CancellationToken::new()).await;

    assert_eq!(result.status, GroupStatus::Completed);
    assert_eq!(result.plan_results.len(), 3);
    for (_, state) in &result.plan_results {
        assert_eq!(state.as_ref().unwrap().plan_status, PlanStatus::Completed);
    }
}

#[tokio::test]
async fn one_failing_plan_among_others_is_partial_failure() {
    let modules = ModuleRegistryBuilder::new()
        .register(Arc::new(EchoModule::new("echo")))
        .register(Arc::new(FailingModule::new("fail", "boom")))
        .build();
    let executor = Arc::new(build_executor(modules).await);
    let group = PlanGroupExecutor::new(executor, 2, Duration::from_secs(5));

    let plans = vec![plan("p1", vec![echo_action("a1", "echo")]), plan("p2", vec![failing_action("a1")])];

    let result = group.run(plans, CancellationToken::new()).await;

    assert_eq!(result.status, GroupStatus::PartialFailure);
    assert_eq!(result.plan_results.len(), 2);
}

#[tokio::test]
async fn all_plans_failing_is_group_failed() {
    let modules = ModuleRegistryBuilder::new().register(Arc::new(FailingModule::new("fail", "boom"))).build();
    let executor = Arc::new(build_executor(modules).await);
    let group = PlanGroupExecutor::new(executor, 2, Duration::from_secs(5));

    let plans = vec![plan("p1", vec![failing_action("a1")]), plan("p2", vec![failing_action("a1")])];

    let result = group.run(plans, CancellationToken::new()).await;

    assert_eq!(result.status, GroupStatus::Failed);
    for (_, state) in &result.plan_results {
        assert_eq!(state.as_ref().unwrap().plan_status, PlanStatus::Failed);
    }
}

#[tokio::test]
async fn max_concurrent_bounds_simultaneous_dispatch() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let modules = ModuleRegistryBuilder::new()
        .register(Arc::new(TrackingModule::new("track", Duration::from_millis(30), current.clone(), peak.clone())))
        .build();
    let executor = Arc::new(build_executor(modules).await);
    let group = PlanGroupExecutor::new(executor, 2, Duration::from_secs(5));

    let plans = (0..6).map(|i| plan(&format!("p{i}"), vec![echo_action("a1", "track")])).collect();

    let result = group.run(plans, CancellationToken::new()).await;

    assert_eq!(result.status, GroupStatus::Completed);
    assert!(peak.load(Ordering::SeqCst) <= 2, "peak concurrency {} exceeded max_concurrent", peak.load(Ordering::SeqCst));
}

#[tokio::test]
async fn group_timeout_cancels_in_flight_plans_and_still_collects_them() {
    let modules = ModuleRegistryBuilder::new()
        .register(Arc::new(SlowModule::new("slow", Duration::from_millis(200))))
        .build();
    let executor = Arc::new(build_executor(modules).await);
    let group = PlanGroupExecutor::new(executor, 4, Duration::from_millis(30));

    let plans = vec![plan("p1", vec![echo_action("a1", "slow")])];
    let result = group.run(plans, CancellationToken::new()).await;

    assert_eq!(result.plan_results.len(), 1);
    let (plan_id, state) = &result.plan_results[0];
    assert_eq!(plan_id, &PlanId::from("p1"));
    let state = state.as_ref().expect("a cancelled plan's state is still collected, not dropped");
    assert_eq!(state.plan_status, PlanStatus::Cancelled);
    assert_eq!(result.status, GroupStatus::Failed);
}

#[tokio::test]
async fn parent_cancellation_cascades_to_child_plans() {
    let modules = ModuleRegistryBuilder::new()
        .register(Arc::new(SlowModule::new("slow", Duration::from_millis(200))))
        .build();
    let executor = Arc::new(build_executor(modules).await);
    let group = PlanGroupExecutor::new(executor, 4, Duration::from_secs(10));

    let parent_cancel = CancellationToken::new();
    parent_cancel.cancel();

    let plans = vec![plan("p1", vec![echo_action("a1", "slow")])];
    let result = group.run(plans, parent_cancel).await;

    let (_, state) = &result.plan_results[0];
    let state = state.as_ref().expect("a cancelled plan's state is still collected, not dropped");
    assert_eq!(state.plan_status, PlanStatus::Cancelled);
}
