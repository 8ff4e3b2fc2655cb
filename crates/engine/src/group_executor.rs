// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan Group Executor (spec.md §4.13): fans a list of plans out across the
//! single-plan [`PlanExecutor`], bounded by `max_concurrent`, with a
//! group-level timeout that cooperatively cancels whatever is still
//! in-flight when it expires.

use crate::plan_executor::PlanExecutor;
use iml_core::plan::IMLPlan;
use iml_core::state::{ExecutionState, PlanStatus};
use iml_core::{Clock, PlanId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    Completed,
    PartialFailure,
    Failed,
}

pub struct GroupResult {
    pub status: GroupStatus,
    pub plan_results: Vec<(PlanId, Option<ExecutionState>)>,
}

pub struct PlanGroupExecutor<C: Clock> {
    executor: Arc<PlanExecutor<C>>,
    max_concurrent: usize,
    group_timeout: Duration,
}

impl<C: Clock + 'static> PlanGroupExecutor<C> {
    pub fn new(executor: Arc<PlanExecutor<C>>, max_concurrent: usize, group_timeout: Duration) -> Self {
        Self { executor, max_concurrent: max_concurrent.max(1), group_timeout }
    }

    /// Runs every plan in `plans`, at most `max_concurrent` dispatched at
    /// once. If `group_timeout` elapses before all plans finish, every
    /// still-running plan's [`CancellationToken`] fires and its eventual
    /// (likely CANCELLED) result is still collected.
    pub async fn run(&self, plans: Vec<IMLPlan>, parent_cancel: CancellationToken) -> GroupResult {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let group_cancel = CancellationToken::new();

        // Cancelling `group_cancel` cascades to every child token handed to
        // an individual plan run, so the parent only needs forwarding once.
        let forward = {
            let group_cancel = group_cancel.clone();
            let parent_cancel = parent_cancel.clone();
            tokio::spawn(async move {
                parent_cancel.cancelled().await;
                group_cancel.cancel();
            })
        };

        let handles: Vec<_> = plans
            .into_iter()
            .map(|plan| {
                let executor = self.executor.clone();
                let semaphore = semaphore.clone();
                let plan_id = plan.plan_id.clone();
                let cancel = group_cancel.child_token();
                tokio::spawn(async move {
                    #[allow(clippy::expect_used)]
                    let _permit = semaphore.acquire_owned().await.expect("group semaphore is never closed");
                    let result = executor.run(plan, cancel).await;
                    (plan_id, result.ok())
                })
            })
            .collect();

        let mut collector = tokio::spawn(join_all_handles(handles));

        let plan_results = tokio::select! {
            result = &mut collector => result.unwrap_or_default(),
            () = tokio::time::sleep(self.group_timeout) => {
                // Let every in-flight plan wind down under cancellation and
                // still collect whatever CANCELLED/FAILED states they land
                // on, rather than discarding them.
                group_cancel.cancel();
                collector.await.unwrap_or_default()
            }
        };

        forward.abort();
        let status = aggregate_status(&plan_results);
        GroupResult { status, plan_results }
    }
}

async fn join_all_handles(
    handles: Vec<tokio::task::JoinHandle<(PlanId, Option<ExecutionState>)>>,
) -> Vec<(PlanId, Option<ExecutionState>)> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(pair) => out.push(pair),
            Err(err) => {
                tracing::error!(error = %err, "plan_group_executor: plan task panicked");
            }
        }
    }
    out
}

/// COMPLETED if every plan completed, FAILED if every plan failed, else
/// PARTIAL_FAILURE (spec.md §4.13).
fn aggregate_status(results: &[(PlanId, Option<ExecutionState>)]) -> GroupStatus {
    if results.is_empty() {
        return GroupStatus::Failed;
    }
    let completed = results
        .iter()
        .filter(|(_, state)| state.as_ref().map(|s| s.plan_status == PlanStatus::Completed).unwrap_or(false))
        .count();
    if completed == results.len() {
        GroupStatus::Completed
    } else if completed == 0 {
        GroupStatus::Failed
    } else {
        GroupStatus::PartialFailure
    }
}

#[cfg(test)]
#[path = "group_executor_tests.rs"]
mod tests;
