// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan Executor (spec.md §4.12): the `run(plan)` lifecycle — preflight,
//! state init, wave loop, failure handling, rollback, finalisation.

use crate::alternatives::suggest_alternatives;
use crate::error::EngineError;
use crate::node::NodeRegistry;
use crate::registry::ModuleRegistry;
use crate::session::SessionContextPropagator;
use iml_bus::{topics, EventBus};
use iml_core::event::EventRecord;
use iml_core::plan::{ExecutionMode, IMLAction, IMLPlan, OnError};
use iml_core::state::{ActionState, ActionStatus, ApprovalMetadata, ExecutionState, PlanStatus};
use iml_core::{ActionId, Clock, PlanId};
use iml_protocol::template::{resolve_params, MemoryStore, TemplateContext, TriggerScope};
use iml_scheduler::{emit_waves, PlanGraph};
use iml_security::{
    flatten_for_scan, sanitise, ApprovalDecision, ApprovalGate, ApprovalRequest, DecisionKind, OnTimeout,
    PermissionGuard, RateLimiter, ResourceManager, SanitiserConfig, ScanContext, ScanVerdict, ScannerPipeline,
    SecurityError,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitConfig {
    pub per_minute: Option<usize>,
    pub per_hour: Option<usize>,
}

/// Everything about a [`PlanExecutor`] that is policy rather than
/// collaborator wiring.
pub struct ExecutorConfig {
    pub fallback_chains: HashMap<iml_core::ModuleId, Vec<iml_core::ModuleId>>,
    pub rate_limits: HashMap<String, RateLimitConfig>,
    pub approval_timeout: Duration,
    pub approval_on_timeout: OnTimeout,
    /// SPEC_FULL.md §C.7: rollback actions never inherit the plan's own
    /// timeout; each gets this fixed budget instead.
    pub rollback_timeout: Duration,
    pub sanitiser: SanitiserConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            fallback_chains: HashMap::new(),
            rate_limits: HashMap::new(),
            approval_timeout: Duration::from_secs(300),
            approval_on_timeout: OnTimeout::TreatAsReject,
            rollback_timeout: Duration::from_secs(30),
            sanitiser: SanitiserConfig::default(),
        }
    }
}

pub struct PlanExecutor<C: Clock> {
    state_store: Arc<iml_storage::StateStore>,
    event_bus: Arc<dyn EventBus>,
    permission_guard: PermissionGuard,
    scanner_pipeline: ScannerPipeline,
    rate_limiter: RateLimiter,
    resource_manager: ResourceManager,
    approval_gate: Arc<ApprovalGate>,
    node_registry: NodeRegistry,
    module_registry: ModuleRegistry,
    memory: Arc<dyn MemoryStore>,
    session: Arc<SessionContextPropagator>,
    clock: C,
    config: ExecutorConfig,
}

/// What one action attempt produced, before it is folded into the
/// persisted [`ExecutionState`].
struct ActionOutcome {
    action_id: ActionId,
    status: ActionStatus,
    result: Option<Value>,
    error: Option<String>,
    attempt: u32,
    alternatives: Vec<String>,
    approval_metadata: Option<ApprovalMetadata>,
    started_at: i64,
    finished_at: i64,
}

/// What one pass through template resolution / approval / rate limiting /
/// dispatch / sanitisation produced, before `on_error` policy is applied.
enum StepOutcome {
    Completed(Value, i64, i64),
    Skipped,
    Failed(EngineError),
}

impl<C: Clock> PlanExecutor<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state_store: Arc<iml_storage::StateStore>,
        event_bus: Arc<dyn EventBus>,
        permission_guard: PermissionGuard,
        scanner_pipeline: ScannerPipeline,
        rate_limiter: RateLimiter,
        resource_manager: ResourceManager,
        approval_gate: Arc<ApprovalGate>,
        node_registry: NodeRegistry,
        module_registry: ModuleRegistry,
        memory: Arc<dyn MemoryStore>,
        session: Arc<SessionContextPropagator>,
        clock: C,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            state_store,
            event_bus,
            permission_guard,
            scanner_pipeline,
            rate_limiter,
            resource_manager,
            approval_gate,
            node_registry,
            module_registry,
            memory,
            session,
            clock,
            config,
        }
    }

    fn now_ms(&self) -> i64 {
        self.clock.epoch_ms() as i64
    }

    async fn emit(&self, record: EventRecord) {
        self.event_bus.emit(record).await;
    }

    fn plan_event(&self, event: &str, plan: &IMLPlan, now: i64) -> EventRecord {
        let mut payload = Map::new();
        payload.insert("plan_id".to_string(), Value::String(plan.plan_id.to_string()));
        EventRecord::new(topics::PLANS, event, "plan_executor", now).with_payload(payload)
    }

    fn action_event(&self, event: &str, plan_id: &PlanId, action_id: &ActionId, now: i64) -> EventRecord {
        let mut payload = Map::new();
        payload.insert("plan_id".to_string(), Value::String(plan_id.to_string()));
        payload.insert("action_id".to_string(), Value::String(action_id.to_string()));
        EventRecord::new(topics::ACTIONS, event, "plan_executor", now).with_payload(payload)
    }

    /// Runs a plan end to end and returns its final persisted state.
    /// Only returns `Err` for infrastructure failures (storage, scheduler
    /// construction); every plan-level rejection is reported through the
    /// returned [`ExecutionState`] instead.
    pub async fn run(&self, plan: IMLPlan, cancel: CancellationToken) -> Result<ExecutionState, EngineError> {
        let submitted_at = self.now_ms();
        self.emit(self.plan_event("plan_submitted", &plan, submitted_at)).await;

        let mut state = ExecutionState::new(plan.plan_id.clone(), submitted_at);
        for action in &plan.actions {
            state.actions.insert(action.id.clone(), ActionState::pending(action.id.clone()));
        }
        self.state_store.create(&state).await?;

        if let Err((status, details)) = self.preflight(&plan).await {
            let now = self.now_ms();
            self.state_store.update_plan_status(&plan.plan_id, status, Some(details.clone()), now).await?;
            state.plan_status = status;
            state.rejection_details = Some(details);
            state.updated_at = now;
            self.emit(self.plan_event("plan_failed", &plan, now)).await;
            return Ok(state);
        }

        let started_at = self.now_ms();
        self.state_store.update_plan_status(&plan.plan_id, PlanStatus::Running, None, started_at).await?;
        state.plan_status = PlanStatus::Running;
        state.updated_at = started_at;
        self.emit(self.plan_event("plan_started", &plan, started_at)).await;

        let graph = PlanGraph::build(&plan)?;
        let waves = emit_waves(&graph, plan.execution_mode)?;
        let trigger_scope = self.session.get(&plan.plan_id);

        let mut results: HashMap<String, Value> = HashMap::new();
        let mut completion_order: Vec<ActionId> = Vec::new();

        'waves: for wave in &waves {
            if cancel.is_cancelled() {
                break 'waves;
            }

            let snapshot = results.clone();
            let outcomes: Vec<ActionOutcome> = if plan.execution_mode == ExecutionMode::Sequential {
                let mut out = Vec::with_capacity(wave.actions.len());
                for action_id in &wave.actions {
                    #[allow(clippy::expect_used)]
                    let action = plan.find_action(action_id).expect("wave only names actions in this plan");
                    out.push(
                        self.run_action(&plan, action, &state, &snapshot, trigger_scope.as_ref(), &cancel).await,
                    );
                }
                out
            } else {
                let futures = wave.actions.iter().map(|action_id| {
                    #[allow(clippy::expect_used)]
                    let action = plan.find_action(action_id).expect("wave only names actions in this plan");
                    self.run_action(&plan, action, &state, &snapshot, trigger_scope.as_ref(), &cancel)
                });
                futures_util::future::join_all(futures).await
            };

            let mut wave_halts = false;
            for outcome in outcomes {
                let now = outcome.finished_at;
                let mut action_state = state
                    .actions
                    .get(&outcome.action_id)
                    .cloned()
                    .unwrap_or_else(|| ActionState::pending(outcome.action_id.clone()));
                action_state.status = outcome.status;
                action_state.started_at = Some(outcome.started_at);
                action_state.finished_at = Some(outcome.finished_at);
                action_state.attempt = outcome.attempt;
                action_state.alternatives = outcome.alternatives.clone();
                action_state.approval_metadata = outcome.approval_metadata.clone();
                action_state.error = outcome.error.clone();
                action_state.result = outcome.result.clone();

                match outcome.status {
                    ActionStatus::Completed => {
                        if let Some(value) = &outcome.result {
                            results.insert(outcome.action_id.to_string(), value.clone());
                        }
                        completion_order.push(outcome.action_id.clone());
                        self.emit(self.action_event("action_completed", &plan.plan_id, &outcome.action_id, now))
                            .await;
                    }
                    ActionStatus::Failed => {
                        self.emit(self.action_event("action_failed", &plan.plan_id, &outcome.action_id, now))
                            .await;
                        #[allow(clippy::expect_used)]
                        let action =
                            plan.find_action(&outcome.action_id).expect("outcome action exists in this plan");
                        if action_halts(action, &action_state) {
                            wave_halts = true;
                        }
                    }
                    ActionStatus::Skipped => {
                        self.emit(self.action_event("action_skipped", &plan.plan_id, &outcome.action_id, now))
                            .await;
                    }
                    _ => {}
                }

                state.actions.insert(outcome.action_id.clone(), action_state.clone());
                self.state_store.update_action(&plan.plan_id, &action_state).await?;
            }

            state.updated_at = self.now_ms();
            if wave_halts || cancel.is_cancelled() {
                break 'waves;
            }
        }

        if state.any_action_failed() {
            self.run_rollback(&plan, &results, trigger_scope.as_ref(), &completion_order).await;
        }

        self.finalize_pending_as_skipped(&plan, &mut state).await?;

        let final_status = if cancel.is_cancelled() {
            PlanStatus::Cancelled
        } else if state.any_action_failed() {
            PlanStatus::Failed
        } else {
            PlanStatus::Completed
        };
        let now = self.now_ms();
        self.state_store.update_plan_status(&plan.plan_id, final_status, None, now).await?;
        state.plan_status = final_status;
        state.updated_at = now;

        let event = match final_status {
            PlanStatus::Completed => "plan_completed",
            PlanStatus::Cancelled => "plan_cancelled",
            _ => "plan_failed",
        };
        self.emit(self.plan_event(event, &plan, now)).await;

        Ok(state)
    }

    /// Preflight (spec.md §4.12 step 1): semantic validation, module
    /// version requirements, permission preflight, scanner pipeline.
    async fn preflight(&self, plan: &IMLPlan) -> Result<(), (PlanStatus, Value)> {
        if let Err(err) = iml_protocol::validate(plan) {
            return Err((PlanStatus::Failed, serde_json::json!({"stage": "validate", "error": err.to_string()})));
        }

        for (module_id, required_version) in &plan.module_requirements {
            match self.module_registry.manifest(module_id) {
                Some(manifest) if &manifest.version == required_version => {}
                Some(manifest) => {
                    return Err((
                        PlanStatus::Failed,
                        serde_json::json!({
                            "stage": "module_version",
                            "module": module_id.to_string(),
                            "required": required_version,
                            "found": manifest.version,
                        }),
                    ));
                }
                None => {
                    return Err((
                        PlanStatus::Failed,
                        serde_json::json!({
                            "stage": "module_version",
                            "module": module_id.to_string(),
                            "error": "module not registered",
                        }),
                    ));
                }
            }
        }

        if let Err(err) = self.permission_guard.check_plan_preflight(plan) {
            return Err((PlanStatus::Failed, serde_json::json!({"stage": "permission", "error": err.to_string()})));
        }

        let plan_value = serde_json::to_value(plan).unwrap_or(Value::Null);
        let plan_json = flatten_for_scan(&plan_value);
        let scan_context = ScanContext {
            plan_id: plan.plan_id.to_string(),
            description: plan.description.clone(),
            action_count: plan.actions.len(),
            module_ids: plan.actions.iter().map(|a| a.module.to_string()).collect(),
            session_id: plan.session_id.clone(),
        };
        let (verdict, results) = self.scanner_pipeline.run(&plan_json, &scan_context);
        if verdict == ScanVerdict::Reject {
            return Err((
                PlanStatus::Rejected,
                serde_json::json!({"stage": "scanner", "verdict": "REJECT", "results": results}),
            ));
        }

        Ok(())
    }

    /// One action's full attempt lifecycle, including retries and
    /// dependency cascade-skip. Takes only shared references so waves in
    /// PARALLEL/REACTIVE mode can run concurrently via `join_all`.
    async fn run_action(
        &self,
        plan: &IMLPlan,
        action: &IMLAction,
        state: &ExecutionState,
        results: &HashMap<String, Value>,
        trigger: Option<&TriggerScope>,
        cancel: &CancellationToken,
    ) -> ActionOutcome {
        let blocked = action.depends_on.iter().any(|dep| {
            state
                .actions
                .get(dep)
                .map(|a| matches!(a.status, ActionStatus::Skipped | ActionStatus::Failed))
                .unwrap_or(false)
        });
        if blocked {
            let now = self.now_ms();
            return ActionOutcome {
                action_id: action.id.clone(),
                status: ActionStatus::Skipped,
                result: None,
                error: None,
                attempt: 1,
                alternatives: Vec::new(),
                approval_metadata: None,
                started_at: now,
                finished_at: now,
            };
        }

        let mut attempt = 1u32;
        loop {
            match self.try_action_once(plan, action, results, trigger, cancel).await {
                StepOutcome::Completed(value, started_at, finished_at) => {
                    return ActionOutcome {
                        action_id: action.id.clone(),
                        status: ActionStatus::Completed,
                        result: Some(value),
                        error: None,
                        attempt,
                        alternatives: Vec::new(),
                        approval_metadata: None,
                        started_at,
                        finished_at,
                    };
                }
                StepOutcome::Skipped => {
                    let now = self.now_ms();
                    return ActionOutcome {
                        action_id: action.id.clone(),
                        status: ActionStatus::Skipped,
                        result: None,
                        error: None,
                        attempt,
                        alternatives: Vec::new(),
                        approval_metadata: None,
                        started_at: now,
                        finished_at: now,
                    };
                }
                StepOutcome::Failed(err) => {
                    if action.on_error == OnError::Retry && attempt < action.retry.max_attempts.max(1) {
                        let backoff = action.retry.backoff_for_attempt(attempt);
                        tokio::select! {
                            _ = tokio::time::sleep(Duration::from_secs_f64(backoff)) => {}
                            _ = cancel.cancelled() => {}
                        }
                        attempt += 1;
                        continue;
                    }

                    let now = self.now_ms();
                    let mut approval_metadata = None;
                    let mut alternatives = Vec::new();

                    if action.on_error == OnError::Escalate {
                        let decision = self.escalate(plan, action, &err).await;
                        let continues = decision_continues(&decision);
                        approval_metadata = Some(ApprovalMetadata {
                            decision: Some(if continues { "CONTINUE" } else { "HALT" }.to_string()),
                            approved_by: None,
                            reason: Some(err.to_string()),
                        });
                    } else if action.on_error == OnError::Continue {
                        alternatives = suggest_alternatives(
                            &err.to_string(),
                            &action.module,
                            &action.action,
                            &self.config.fallback_chains,
                            &self.module_registry,
                        );
                    }

                    return ActionOutcome {
                        action_id: action.id.clone(),
                        status: ActionStatus::Failed,
                        result: None,
                        error: Some(err.to_string()),
                        attempt,
                        alternatives,
                        approval_metadata,
                        started_at: now,
                        finished_at: now,
                    };
                }
            }
        }
    }

    /// One dispatch attempt: template resolution, sandbox re-check,
    /// approval gate, rate limiter, resource acquire, dispatch (with
    /// fallback chain), sanitisation.
    async fn try_action_once(
        &self,
        plan: &IMLPlan,
        action: &IMLAction,
        results: &HashMap<String, Value>,
        trigger: Option<&TriggerScope>,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let started_at = self.now_ms();

        let ctx = TemplateContext {
            results,
            memory: &*self.memory,
            allow_env_templates: self.permission_guard.profile.allow_env_templates,
            trigger,
        };
        let mut resolved_params = match resolve_params(&action.params, &ctx) {
            Ok(p) => p,
            Err(err) => return StepOutcome::Failed(EngineError::Template(err)),
        };

        if let Err(err) = self.permission_guard.check_sandbox(&resolved_params) {
            return StepOutcome::Failed(EngineError::Security(err));
        }

        match self.permission_guard.check_action(&action.module, &action.action, action.requires_approval) {
            Ok(()) => {}
            Err(SecurityError::ApprovalRequired { module, action: action_name }) => {
                let now = self.now_ms();
                self.emit(self.action_event("action_approval_requested", &plan.plan_id, &action.id, now)).await;

                let message = action.approval.as_ref().map(|a| a.message.clone()).unwrap_or_else(|| {
                    format!("approval required for {module}.{action_name}")
                });
                let request = ApprovalRequest {
                    plan_id: plan.plan_id.clone(),
                    action_id: action.id.clone(),
                    module: module.clone(),
                    action: action_name.clone(),
                    message,
                    params: resolved_params.clone(),
                };
                let decision = self
                    .approval_gate
                    .request_approval(request, self.config.approval_timeout, self.config.approval_on_timeout)
                    .await;

                match decision.kind {
                    DecisionKind::Approve | DecisionKind::ApproveAlways => {
                        let now = self.now_ms();
                        self.emit(self.action_event("action_approval_granted", &plan.plan_id, &action.id, now))
                            .await;
                    }
                    DecisionKind::Modify => {
                        let now = self.now_ms();
                        self.emit(self.action_event("action_approval_granted", &plan.plan_id, &action.id, now))
                            .await;
                        if let Some(modified) = decision.modified_params {
                            resolved_params = modified;
                        }
                    }
                    DecisionKind::Reject => {
                        let now = self.now_ms();
                        self.emit(self.action_event("action_approval_rejected", &plan.plan_id, &action.id, now))
                            .await;
                        return StepOutcome::Failed(EngineError::Security(SecurityError::ApprovalRequired {
                            module,
                            action: action_name,
                        }));
                    }
                    DecisionKind::Skip => {
                        let now = self.now_ms();
                        self.emit(self.action_event("action_approval_rejected", &plan.plan_id, &action.id, now))
                            .await;
                        return StepOutcome::Skipped;
                    }
                }
            }
            Err(err) => return StepOutcome::Failed(EngineError::Security(err)),
        }

        let key = format!("{}.{}", action.module, action.action);
        let limits = self.config.rate_limits.get(&key).copied().unwrap_or_default();
        if let Err(err) = self.rate_limiter.check_or_raise(&key, limits.per_minute, limits.per_hour) {
            return StepOutcome::Failed(EngineError::Security(err));
        }
        self.rate_limiter.record(&key);

        let _resource_guard = self.resource_manager.acquire(action.module.as_str()).await;

        let now = self.now_ms();
        self.emit(self.action_event("action_started", &plan.plan_id, &action.id, now)).await;

        let target = action.target_node();
        let node_target = if target == crate::node::LOCAL_NODE { None } else { Some(target) };
        let node = match self.node_registry.get(node_target) {
            Ok(node) => node,
            Err(err) => return StepOutcome::Failed(err),
        };

        let dispatch_result =
            node.execute_action(&action.module, &action.action, resolved_params.clone(), cancel).await;
        let raw_result = match dispatch_result {
            Ok(value) => value,
            Err(primary_err) => match self.try_fallback_chain(&node, action, &resolved_params, cancel).await {
                Some(value) => value,
                None => return StepOutcome::Failed(primary_err),
            },
        };

        let sanitised = sanitise(&raw_result, &self.config.sanitiser);
        let finished_at = self.now_ms();
        StepOutcome::Completed(sanitised, started_at, finished_at)
    }

    async fn try_fallback_chain(
        &self,
        node: &Arc<dyn crate::node::BaseNode>,
        action: &IMLAction,
        params: &HashMap<String, Value>,
        cancel: &CancellationToken,
    ) -> Option<Value> {
        let chain = self.config.fallback_chains.get(&action.module)?;
        for fallback_module in chain {
            if let Ok(value) = node.execute_action(fallback_module, &action.action, params.clone(), cancel).await {
                return Some(value);
            }
        }
        None
    }

    /// Synthesises an Approval Gate request whose decision chooses HALT vs
    /// CONTINUE for an ESCALATE action (spec.md §4.12 step 3.b).
    async fn escalate(&self, plan: &IMLPlan, action: &IMLAction, err: &EngineError) -> ApprovalDecision {
        let now = self.now_ms();
        self.emit(self.action_event("action_approval_requested", &plan.plan_id, &action.id, now)).await;

        let request = ApprovalRequest {
            plan_id: plan.plan_id.clone(),
            action_id: action.id.clone(),
            module: action.module.to_string(),
            action: action.action.clone(),
            message: format!(
                "{}.{} failed: {err}. Approve to continue the plan, reject to halt.",
                action.module, action.action
            ),
            params: HashMap::new(),
        };
        let decision = self
            .approval_gate
            .request_approval(request, self.config.approval_timeout, self.config.approval_on_timeout)
            .await;

        let now = self.now_ms();
        let event = if decision_continues(&decision) { "action_approval_granted" } else { "action_approval_rejected" };
        self.emit(self.action_event(event, &plan.plan_id, &action.id, now)).await;

        decision
    }

    /// Rollback (spec.md §4.12 step 4): LIFO over the original successful
    /// completions, single attempt, bypasses the rate limiter, each
    /// rollback action gets its own fixed timeout (SPEC_FULL.md §C.7).
    async fn run_rollback(
        &self,
        plan: &IMLPlan,
        results: &HashMap<String, Value>,
        trigger: Option<&TriggerScope>,
        completion_order: &[ActionId],
    ) {
        for action_id in completion_order.iter().rev() {
            let Some(action) = plan.find_action(action_id) else { continue };
            let Some(rollback_action) = action.rollback.as_deref() else { continue };

            let outcome = tokio::time::timeout(
                self.config.rollback_timeout,
                self.dispatch_rollback(rollback_action, results, trigger),
            )
            .await;

            match outcome {
                Ok(Ok(_)) => {
                    tracing::info!(action_id = %action_id, "rollback_completed");
                }
                Ok(Err(err)) => {
                    tracing::error!(action_id = %action_id, error = %err, "rollback_failed");
                    let now = self.now_ms();
                    self.emit(self.action_event("rollback_failed", &plan.plan_id, action_id, now)).await;
                }
                Err(_) => {
                    tracing::error!(action_id = %action_id, "rollback_failed: timed out");
                    let now = self.now_ms();
                    self.emit(self.action_event("rollback_failed", &plan.plan_id, action_id, now)).await;
                }
            }
        }
    }

    async fn dispatch_rollback(
        &self,
        rollback_action: &IMLAction,
        results: &HashMap<String, Value>,
        trigger: Option<&TriggerScope>,
    ) -> Result<Value, EngineError> {
        let ctx = TemplateContext {
            results,
            memory: &*self.memory,
            allow_env_templates: self.permission_guard.profile.allow_env_templates,
            trigger,
        };
        let params = resolve_params(&rollback_action.params, &ctx)?;
        self.permission_guard.check_sandbox(&params)?;

        let target = rollback_action.target_node();
        let node_target = if target == crate::node::LOCAL_NODE { None } else { Some(target) };
        let node = self.node_registry.get(node_target)?;

        // Rollback must still run even if the plan's own cancellation was
        // what triggered it, so it gets a token of its own.
        let cancel = CancellationToken::new();
        let raw = node.execute_action(&rollback_action.module, &rollback_action.action, params, &cancel).await?;
        Ok(sanitise(&raw, &self.config.sanitiser))
    }

    /// Invariant 2 (spec.md §8): no RUNNING/PENDING/WAITING_APPROVAL may
    /// remain once the plan itself goes terminal — a HALT or cancellation
    /// can leave later waves never dispatched.
    async fn finalize_pending_as_skipped(
        &self,
        plan: &IMLPlan,
        state: &mut ExecutionState,
    ) -> Result<(), EngineError> {
        let now = self.now_ms();
        let pending_ids: Vec<ActionId> =
            state.actions.iter().filter(|(_, a)| !a.status.is_terminal()).map(|(id, _)| id.clone()).collect();

        for action_id in pending_ids {
            if let Some(action_state) = state.actions.get_mut(&action_id) {
                action_state.finalize(ActionStatus::Skipped, now);
                self.state_store.update_action(&plan.plan_id, action_state).await?;
                self.emit(self.action_event("action_skipped", &plan.plan_id, &action_id, now)).await;
            }
        }
        Ok(())
    }
}

fn decision_continues(decision: &ApprovalDecision) -> bool {
    matches!(decision.kind, DecisionKind::Approve | DecisionKind::ApproveAlways | DecisionKind::Modify)
}

/// Whether a FAILED action should halt the plan, given its `on_error`
/// policy (RETRY reaching here means attempts were exhausted).
fn action_halts(action: &IMLAction, action_state: &ActionState) -> bool {
    match action.on_error {
        OnError::Halt | OnError::Retry => true,
        OnError::Continue => false,
        OnError::Escalate => {
            action_state.approval_metadata.as_ref().and_then(|m| m.decision.as_deref()) != Some("CONTINUE")
        }
    }
}

#[cfg(test)]
#[path = "plan_executor_tests.rs"]
mod tests;
