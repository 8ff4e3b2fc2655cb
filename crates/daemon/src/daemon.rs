// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root: wires the State Store, Event Bus, security pipeline,
//! Plan Executor/Group Executor, and Trigger Daemon into one handle and
//! exposes spec.md §6's external interface as plain async methods.
//!
//! No binary, no HTTP/WebSocket/CLI front-end (spec.md §1 Non-goals) — a
//! `Daemon` is a library value the (unbuilt) outer transport layer would
//! hold and call into for every inbound `Request`.

use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::memory::KeyValueMemoryStore;
use iml_bus::EventBus;
use iml_core::{ActionId, Clock, IMLPlan, PlanId, PlanStatus, SystemClock, TriggerDefinition, TriggerId};
use iml_engine::{
    ExecutorConfig, GroupStatus, LocalNode, ModuleRegistry, NodeRegistry, PlanExecutor,
    PlanGroupExecutor, SessionContextPropagator,
};
use iml_security::{
    ApprovalDecision, ApprovalGate, DecisionKind, PermissionGuard, RateLimiter, ResourceManager,
    SanitiserConfig, ScannerConfig, ScannerPipeline,
};
use iml_storage::{StateStore, TriggerStore};
use iml_triggers::TriggerDaemon;
use iml_wire::{
    ActionSummary, ApprovalDecisionPayload, GroupSummary, PlanFilter as WirePlanFilter, PlanResultSummary,
    Response, WireDecisionKind,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// spec.md §6 "when `async` is false, the caller blocks until the plan
/// reaches a terminal state or the 300s hard timeout".
const SYNC_SUBMIT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct Daemon {
    state_store: Arc<StateStore>,
    executor: Arc<PlanExecutor<SystemClock>>,
    trigger_daemon: Arc<TriggerDaemon<SystemClock>>,
    approval_gate: Arc<ApprovalGate>,
    running: Mutex<HashMap<PlanId, CancellationToken>>,
}

impl Daemon {
    /// Connects storage, builds every security/engine collaborator from
    /// `config`, and registers `modules` as the (mandatory, per spec.md
    /// §4.16) local node. Does not start the trigger event loop — call
    /// [`Daemon::spawn_trigger_loop`] once the returned handle is wrapped
    /// in its `Arc`.
    pub async fn connect(config: DaemonConfig, modules: ModuleRegistry) -> Result<Arc<Self>, DaemonError> {
        Self::connect_with(config, modules, SystemClock).await
    }

    async fn connect_with(
        config: DaemonConfig,
        modules: ModuleRegistry,
        clock: SystemClock,
    ) -> Result<Arc<Self>, DaemonError> {
        let state_store = Arc::new(StateStore::connect(&config.database_url).await?);
        let trigger_store = Arc::new(TriggerStore::connect(&config.database_url).await?);
        let event_bus: Arc<dyn EventBus> = Arc::new(iml_bus::LogEventBus);

        let permission_guard = PermissionGuard::new(config.permission_profile.clone(), config.sandbox_roots.clone());

        let mut scanner_pipeline = ScannerPipeline::new(ScannerConfig {
            fail_fast: config.scanner_fail_fast,
            reject_threshold: config.scanner_reject_threshold,
        });
        scanner_pipeline.register(Box::new(iml_security::HeuristicScanner));

        let rate_limiter = RateLimiter::new();

        let mut resource_manager = ResourceManager::new(config.resource_default_limit);
        for (module_id, limit) in &config.resource_overrides {
            resource_manager = resource_manager.with_override(module_id.as_str(), *limit);
        }

        let approval_gate = Arc::new(ApprovalGate::new());
        let session = Arc::new(SessionContextPropagator::new());
        let memory: Arc<dyn iml_protocol::template::MemoryStore> = Arc::new(KeyValueMemoryStore::new());

        let node_registry = NodeRegistry::new(LocalNode::new(modules.clone()));

        let executor_config = ExecutorConfig {
            fallback_chains: config.fallback_chains.clone(),
            rate_limits: config
                .rate_limits
                .iter()
                .map(|(key, rule)| (key.clone(), (*rule).into()))
                .collect(),
            approval_timeout: config.approval_timeout(),
            approval_on_timeout: config.approval_on_timeout.into(),
            rollback_timeout: config.rollback_timeout(),
            sanitiser: SanitiserConfig {
                max_str_len: config.sanitiser_max_str_len,
                max_depth: config.sanitiser_max_depth,
                max_list_items: config.sanitiser_max_list_items,
            },
        };

        let executor = Arc::new(PlanExecutor::new(
            state_store.clone(),
            event_bus.clone(),
            permission_guard,
            scanner_pipeline,
            rate_limiter,
            resource_manager,
            approval_gate.clone(),
            node_registry,
            modules,
            memory,
            session.clone(),
            clock.clone(),
            executor_config,
        ));

        let trigger_daemon =
            TriggerDaemon::new(trigger_store, executor.clone(), session, event_bus, clock);

        Ok(Arc::new(Self {
            state_store,
            executor,
            trigger_daemon,
            approval_gate,
            running: Mutex::new(HashMap::new()),
        }))
    }

    /// Starts the Trigger Daemon's fire-callback event loop (spec.md
    /// §4.14). Spawned separately from `connect` so callers can finish any
    /// one-time setup (e.g. re-registering persisted triggers) first.
    pub fn spawn_trigger_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.trigger_daemon.spawn_event_loop()
    }

    /// Recovers plans orphaned by an unclean shutdown (spec.md §4.4),
    /// marking them FAILED rather than resuming them blind.
    pub async fn recover_non_terminal(&self) -> Result<Vec<PlanId>, DaemonError> {
        Ok(self.state_store.recover_non_terminal(SystemClock.epoch_ms() as i64).await?)
    }

    pub async fn submit_plan(self: &Arc<Self>, plan: IMLPlan, run_async: bool) -> Result<Response, DaemonError> {
        let plan_id = plan.plan_id.clone();
        let cancel = CancellationToken::new();
        self.running.lock().insert(plan_id.clone(), cancel.clone());

        if run_async {
            let daemon = self.clone();
            let pid = plan_id.clone();
            tokio::spawn(async move {
                let result = daemon.executor.run(plan, cancel).await;
                daemon.running.lock().remove(&pid);
                if let Err(err) = result {
                    tracing::error!(plan_id = %pid, error = %err, "async plan dispatch failed");
                }
            });
            return Ok(Response::PlanSubmitted {
                plan_id,
                status: PlanStatus::Queued,
                message: "accepted".to_string(),
                actions: None,
            });
        }

        let outcome = tokio::time::timeout(SYNC_SUBMIT_TIMEOUT, self.executor.run(plan, cancel)).await;
        self.running.lock().remove(&plan_id);
        match outcome {
            Ok(Ok(state)) => {
                let actions = state
                    .actions
                    .values()
                    .map(|a| ActionSummary { action_id: a.action_id.clone(), status: a.status, error: a.error.clone() })
                    .collect();
                Ok(Response::PlanSubmitted {
                    plan_id,
                    status: state.plan_status,
                    message: "completed".to_string(),
                    actions: Some(actions),
                })
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_elapsed) => Err(DaemonError::SubmitTimedOut(plan_id)),
        }
    }

    pub async fn get_plan(&self, plan_id: &PlanId) -> Result<Response, DaemonError> {
        match self.state_store.get(plan_id).await? {
            Some(state) => Ok(Response::Plan { state: Box::new(state) }),
            None => Ok(Response::PlanNotFound { plan_id: plan_id.clone() }),
        }
    }

    pub async fn list_plans(&self, filter: WirePlanFilter, page: u32, per_page: u32) -> Result<Response, DaemonError> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let offset = (page - 1) as i64 * per_page as i64;
        let storage_filter = iml_storage::PlanFilter { status: filter.status };

        let states = self.state_store.list(storage_filter, per_page as i64, offset).await?;
        let total = self.state_store.count(storage_filter).await?;

        let plans = states
            .into_iter()
            .map(|s| iml_wire::PlanSummary {
                plan_id: s.plan_id,
                status: s.plan_status,
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect();

        Ok(Response::Plans { plans, total: total.max(0) as usize, page, per_page })
    }

    pub async fn cancel_plan(&self, plan_id: &PlanId) -> Result<Response, DaemonError> {
        let cancelled = match self.running.lock().get(plan_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        };
        Ok(Response::PlanCancelled { cancelled })
    }

    pub async fn submit_plan_group(
        self: &Arc<Self>,
        plans: Vec<IMLPlan>,
        max_concurrent: usize,
        timeout_seconds: u64,
        group_id: Option<String>,
    ) -> Response {
        let group_id = group_id.unwrap_or_else(|| nanoid::nanoid!(10));
        let group_executor =
            PlanGroupExecutor::new(self.executor.clone(), max_concurrent, Duration::from_secs(timeout_seconds));

        let started = Instant::now();
        let result = group_executor.run(plans, CancellationToken::new()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut plan_results = Vec::with_capacity(result.plan_results.len());
        let mut errors = Vec::new();
        let mut summary = GroupSummary::default();
        for (plan_id, state) in result.plan_results {
            match state {
                Some(state) => {
                    match state.plan_status {
                        PlanStatus::Completed => summary.completed += 1,
                        PlanStatus::Cancelled => summary.cancelled += 1,
                        _ => summary.failed += 1,
                    }
                    plan_results.push(PlanResultSummary { plan_id, status: state.plan_status });
                }
                None => {
                    errors.push(format!("plan {plan_id} did not produce a final state"));
                    summary.failed += 1;
                }
            }
        }
        // `partial_failure` is a 0/1 flag on the group as a whole, not a
        // per-plan counter: distinguishes "every plan failed" from "some did".
        if result.status == GroupStatus::PartialFailure {
            summary.partial_failure = 1;
        }

        Response::GroupResult { group_id, plan_results, errors, summary, duration_ms }
    }

    pub async fn submit_approval_decision(
        &self,
        plan_id: PlanId,
        action_id: ActionId,
        payload: ApprovalDecisionPayload,
    ) -> Result<Response, DaemonError> {
        let pending = self.approval_gate.get_pending(Some(&plan_id));
        let decision_id = pending
            .into_iter()
            .find(|(_, request)| request.action_id == action_id)
            .map(|(id, _)| id)
            .ok_or_else(|| DaemonError::NoPendingApproval { plan_id: plan_id.clone(), action_id: action_id.clone() })?;

        let decision = ApprovalDecision {
            kind: wire_decision_to_internal(payload.decision),
            modified_params: payload.modified_params.map(|m| m.into_iter().collect()),
        };
        let applied = self.approval_gate.submit_decision(&decision_id, decision);
        Ok(Response::ApprovalApplied { applied })
    }

    pub async fn register_trigger(&self, definition: TriggerDefinition) -> Result<Response, DaemonError> {
        let trigger_id = definition.trigger_id.clone();
        self.trigger_daemon.register(definition).await?;
        Ok(Response::TriggerRegistered { trigger_id })
    }

    pub async fn activate_trigger(&self, trigger_id: TriggerId) -> Result<Response, DaemonError> {
        self.trigger_daemon.activate(&trigger_id).await?;
        Ok(Response::TriggerStateChanged { trigger_id })
    }

    pub async fn deactivate_trigger(&self, trigger_id: TriggerId) -> Result<Response, DaemonError> {
        self.trigger_daemon.deactivate(&trigger_id).await?;
        Ok(Response::TriggerStateChanged { trigger_id })
    }

    pub async fn delete_trigger(&self, trigger_id: TriggerId) -> Result<Response, DaemonError> {
        self.trigger_daemon.delete(&trigger_id).await?;
        Ok(Response::TriggerDeleted { trigger_id })
    }

    pub async fn list_triggers(&self) -> Result<Response, DaemonError> {
        Ok(Response::Triggers { triggers: self.trigger_daemon.list().await? })
    }

    pub async fn get_trigger(&self, trigger_id: TriggerId) -> Result<Response, DaemonError> {
        let trigger = self.trigger_daemon.get(&trigger_id).await?;
        Ok(Response::Trigger { trigger: trigger.map(Box::new) })
    }
}

fn wire_decision_to_internal(kind: WireDecisionKind) -> DecisionKind {
    match kind {
        WireDecisionKind::Approve => DecisionKind::Approve,
        WireDecisionKind::Reject => DecisionKind::Reject,
        WireDecisionKind::Skip => DecisionKind::Skip,
        WireDecisionKind::Modify => DecisionKind::Modify,
        WireDecisionKind::ApproveAlways => DecisionKind::ApproveAlways,
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
