// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger Daemon (spec.md §4.14): owns trigger definitions, spins up a
//! watcher per ACTIVE trigger, and on every fire callback runs the
//! throttle/chain-depth/conflict-policy protocol before handing the
//! instantiated plan to the Plan Executor.

use crate::error::TriggerError;
use crate::watcher::{self, FireEvent, WatcherHandle};
use iml_bus::{topics, EventBus};
use iml_core::event::EventRecord;
use iml_core::trigger::{ConflictPolicy, TriggerDefinition, TriggerState};
use iml_core::{Clock, PlanId, TriggerId};
use iml_engine::{PlanExecutor, SessionContextPropagator};
use iml_protocol::template::TriggerScope;
use iml_storage::TriggerStore;
use parking_lot::Mutex;
use serde_json::Map;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

struct RunningFire {
    plan_id: PlanId,
    cancel: CancellationToken,
}

pub struct TriggerDaemon<C: Clock + 'static> {
    store: Arc<TriggerStore>,
    executor: Arc<PlanExecutor<C>>,
    session: Arc<SessionContextPropagator>,
    event_bus: Arc<dyn EventBus>,
    clock: C,
    watchers: Mutex<HashMap<TriggerId, WatcherHandle>>,
    /// Fire timestamps (ms) within the last rolling hour, for `max_fires_per_hour`.
    fire_windows: Mutex<HashMap<TriggerId, VecDeque<i64>>>,
    running: Mutex<HashMap<TriggerId, RunningFire>>,
    tx: UnboundedSender<FireEvent>,
    rx: Mutex<Option<UnboundedReceiver<FireEvent>>>,
}

impl<C: Clock + 'static> TriggerDaemon<C> {
    pub fn new(
        store: Arc<TriggerStore>,
        executor: Arc<PlanExecutor<C>>,
        session: Arc<SessionContextPropagator>,
        event_bus: Arc<dyn EventBus>,
        clock: C,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            store,
            executor,
            session,
            event_bus,
            clock,
            watchers: Mutex::new(HashMap::new()),
            fire_windows: Mutex::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
            tx,
            rx: Mutex::new(Some(rx)),
        })
    }

    fn now_ms(&self) -> i64 {
        self.clock.epoch_ms() as i64
    }

    pub async fn register(&self, definition: TriggerDefinition) -> Result<(), TriggerError> {
        self.store.create(&definition, self.now_ms()).await?;
        Ok(())
    }

    /// Spins up the watcher task for a REGISTERED/INACTIVE trigger and marks
    /// it ACTIVE. Re-activating an already-active trigger replaces its
    /// watcher rather than stacking a second one.
    pub async fn activate(&self, trigger_id: &TriggerId) -> Result<(), TriggerError> {
        let definition =
            self.store.get(trigger_id).await?.ok_or_else(|| TriggerError::NotFound(trigger_id.clone()))?;

        if let Some(old) = self.watchers.lock().remove(trigger_id) {
            old.stop().await;
        }

        let handle = watcher::spawn(trigger_id.clone(), definition.condition.clone(), self.tx.clone());
        self.watchers.lock().insert(trigger_id.clone(), handle);
        self.store.set_state(trigger_id, TriggerState::Active, self.now_ms()).await?;
        Ok(())
    }

    pub async fn deactivate(&self, trigger_id: &TriggerId) -> Result<(), TriggerError> {
        if let Some(handle) = self.watchers.lock().remove(trigger_id) {
            handle.stop().await;
        }
        self.store.set_state(trigger_id, TriggerState::Inactive, self.now_ms()).await?;
        Ok(())
    }

    pub async fn delete(&self, trigger_id: &TriggerId) -> Result<(), TriggerError> {
        if let Some(handle) = self.watchers.lock().remove(trigger_id) {
            handle.stop().await;
        }
        self.store.delete(trigger_id).await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<TriggerDefinition>, TriggerError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn get(&self, trigger_id: &TriggerId) -> Result<Option<TriggerDefinition>, TriggerError> {
        Ok(self.store.get(trigger_id).await?)
    }

    /// Starts the daemon's own fire-handling loop. Must be called exactly
    /// once per daemon instance; each fire is handled on its own spawned
    /// task so a slow dispatch never blocks the next trigger's callback.
    pub fn spawn_event_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let daemon = self.clone();
        tokio::spawn(async move { daemon.run_event_loop().await })
    }

    async fn run_event_loop(self: Arc<Self>) {
        #[allow(clippy::expect_used)]
        let mut rx = self.rx.lock().take().expect("spawn_event_loop called more than once");
        while let Some(event) = rx.recv().await {
            let daemon = self.clone();
            tokio::spawn(async move { daemon.handle_fire(event).await });
        }
    }

    /// spec.md §4.14 "On each fire callback" steps 1-7.
    async fn handle_fire(&self, event: FireEvent) {
        let trigger_id = event.trigger_id.clone();
        let now = self.now_ms();

        if let Some(reason) = event.watcher_error {
            tracing::error!(trigger_id = %trigger_id, reason, "trigger_watcher_failed");
            self.watchers.lock().remove(&trigger_id);
            if let Err(err) = self.fail_watcher(&trigger_id, &reason, now).await {
                tracing::error!(trigger_id = %trigger_id, error = %err, "failed to persist watcher failure");
            }
            return;
        }

        let Ok(Some(mut definition)) = self.store.get(&trigger_id).await else {
            tracing::warn!(trigger_id = %trigger_id, "fire callback for unknown trigger, ignoring");
            return;
        };

        if !definition.state.is_fire_ready() {
            return;
        }

        if !definition.can_fire(now) {
            definition.health.throttle_count += 1;
            let _ = self.store.update(&definition, now).await;
            self.emit_trigger_event("trigger_throttled", &trigger_id, None).await;
            return;
        }
        if self.fires_in_last_hour(&trigger_id, now) >= definition.max_fires_per_hour.max(1) as usize
            && definition.max_fires_per_hour > 0
        {
            definition.health.throttle_count += 1;
            let _ = self.store.update(&definition, now).await;
            self.emit_trigger_event("trigger_throttled", &trigger_id, None).await;
            return;
        }

        if definition.chain_depth_exceeded() {
            self.emit_trigger_event("trigger_rejected_chain_depth", &trigger_id, None).await;
            return;
        }

        match self.admit_under_conflict_policy(&trigger_id, definition.conflict_policy).await {
            Admission::Rejected => {
                self.emit_trigger_event("trigger_fire_dropped_conflict", &trigger_id, None).await;
                return;
            }
            Admission::Admitted => {}
        }

        self.record_fire(&trigger_id, now);

        let plan_id = PlanId::new(format!("{}-{}", trigger_id.as_str(), nanoid::nanoid!(10)));
        let mut plan = definition.plan_template.clone();
        plan.plan_id = plan_id.clone();

        let scope = TriggerScope {
            trigger_id: trigger_id.to_string(),
            event_type: event.event_type.clone(),
            payload: event.payload.clone(),
            fired_at: now,
        };
        self.session.bind(plan_id.clone(), scope);

        let cancel = CancellationToken::new();
        self.running.lock().insert(trigger_id.clone(), RunningFire { plan_id: plan_id.clone(), cancel: cancel.clone() });

        definition.state = TriggerState::Fired;
        definition.last_fired_at = Some(now);
        let _ = self.store.update(&definition, now).await;
        self.emit_trigger_event("trigger_fired", &trigger_id, Some(&plan_id)).await;

        let dispatch_started = self.now_ms();
        let outcome = self.executor.run(plan, cancel).await;
        let dispatch_finished = self.now_ms();

        self.session.unbind(&plan_id);
        self.running.lock().remove(&trigger_id);

        let failed = !matches!(outcome, Ok(ref state) if state.plan_status == iml_core::PlanStatus::Completed);
        let Ok(Some(mut definition)) = self.store.get(&trigger_id).await else { return };
        definition.health.fire_count += 1;
        if failed {
            definition.health.fail_count += 1;
        }
        let elapsed = (dispatch_finished - dispatch_started).max(0) as f64;
        let n = definition.health.fire_count as f64;
        definition.health.avg_latency_ms = definition.health.avg_latency_ms + (elapsed - definition.health.avg_latency_ms) / n;
        definition.state = TriggerState::Watching;
        let _ = self.store.update(&definition, dispatch_finished).await;

        self.emit_trigger_event(if failed { "trigger_plan_failed" } else { "trigger_plan_completed" }, &trigger_id, Some(&plan_id))
            .await;
    }

    async fn fail_watcher(&self, trigger_id: &TriggerId, reason: &str, now: i64) -> Result<(), TriggerError> {
        if let Some(mut definition) = self.store.get(trigger_id).await? {
            definition.state = TriggerState::Failed;
            definition.health.last_error = Some(reason.to_string());
            self.store.update(&definition, now).await?;
        }
        self.emit_trigger_event("trigger_failed", trigger_id, None).await;
        Ok(())
    }

    fn fires_in_last_hour(&self, trigger_id: &TriggerId, now: i64) -> usize {
        let mut windows = self.fire_windows.lock();
        let entry = windows.entry(trigger_id.clone()).or_default();
        while entry.front().is_some_and(|t| now - *t > 3_600_000) {
            entry.pop_front();
        }
        entry.len()
    }

    fn record_fire(&self, trigger_id: &TriggerId, now: i64) {
        self.fire_windows.lock().entry(trigger_id.clone()).or_default().push_back(now);
    }

    /// QUEUE waits for the previous fire to finish, PREEMPT cancels it and
    /// proceeds immediately, REJECT drops this fire outright.
    async fn admit_under_conflict_policy(&self, trigger_id: &TriggerId, policy: ConflictPolicy) -> Admission {
        loop {
            let still_running = {
                let running = self.running.lock();
                running.get(trigger_id).map(|r| r.cancel.clone())
            };
            let Some(cancel) = still_running else { return Admission::Admitted };

            match policy {
                ConflictPolicy::Reject => return Admission::Rejected,
                ConflictPolicy::Preempt => {
                    cancel.cancel();
                    return Admission::Admitted;
                }
                ConflictPolicy::Queue => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    async fn emit_trigger_event(&self, event: &str, trigger_id: &TriggerId, plan_id: Option<&PlanId>) {
        let mut payload = Map::new();
        payload.insert("trigger_id".to_string(), serde_json::Value::String(trigger_id.to_string()));
        if let Some(plan_id) = plan_id {
            payload.insert("plan_id".to_string(), serde_json::Value::String(plan_id.to_string()));
        }
        let record = EventRecord::new(topics::TRIGGERS, event, "trigger_daemon", self.now_ms()).with_payload(payload);
        self.event_bus.emit(record).await;
    }
}

enum Admission {
    Admitted,
    Rejected,
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
