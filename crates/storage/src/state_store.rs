// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State Store (spec.md §4.4): the durable `plan_id -> ExecutionState` map.
//!
//! Backed by an embedded SQLite database in WAL mode. Writes serialise
//! through a single async mutex on top of SQLite's own single-writer
//! constraint, so callers get an explicit queueing point rather than a
//! bare "database is locked" error under contention.

use crate::error::StorageError;
use iml_core::{ActionId, ActionState, ActionStatus, ExecutionState, PlanId, PlanStatus};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanFilter {
    pub status: Option<PlanStatus>,
}

pub struct StateStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl StateStore {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new().max_connections(1).connect(database_url).await?;
        crate::schema::init(&pool).await?;
        Ok(Self { pool, write_lock: Mutex::new(()) })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, write_lock: Mutex::new(()) }
    }

    pub async fn create(&self, state: &ExecutionState) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        if row_exists(&self.pool, state.plan_id.as_str()).await? {
            return Err(StorageError::PlanAlreadyExists(state.plan_id.to_string()));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO plans (plan_id, plan_status, created_at, updated_at, rejection_details) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(state.plan_id.as_str())
        .bind(state.plan_status.to_string())
        .bind(state.created_at)
        .bind(state.updated_at)
        .bind(json_opt(&state.rejection_details)?)
        .execute(&mut *tx)
        .await?;

        for action in state.actions.values() {
            insert_action(&mut tx, state.plan_id.as_str(), action).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, plan_id: &PlanId) -> Result<Option<ExecutionState>, StorageError> {
        let Some(plan_row) = sqlx::query(
            "SELECT plan_id, plan_status, created_at, updated_at, rejection_details \
             FROM plans WHERE plan_id = ?",
        )
        .bind(plan_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let action_rows = sqlx::query(
            "SELECT action_id, status, started_at, finished_at, result, error, attempt, \
             alternatives, approval_metadata FROM actions WHERE plan_id = ?",
        )
        .bind(plan_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut actions = HashMap::with_capacity(action_rows.len());
        for row in action_rows {
            let action_id: String = row.get("action_id");
            let state = ActionState {
                action_id: ActionId::new(action_id.clone()),
                status: parse_action_status(row.get::<String, _>("status"))?,
                started_at: row.get("started_at"),
                finished_at: row.get("finished_at"),
                result: parse_json_opt(row.get::<Option<String>, _>("result"))?,
                error: row.get("error"),
                attempt: row.get::<i64, _>("attempt") as u32,
                alternatives: parse_json_opt(row.get::<Option<String>, _>("alternatives"))?
                    .unwrap_or_default(),
                approval_metadata: parse_json_opt(
                    row.get::<Option<String>, _>("approval_metadata"),
                )?,
            };
            actions.insert(ActionId::new(action_id), state);
        }

        Ok(Some(ExecutionState {
            plan_id: plan_id.clone(),
            plan_status: parse_plan_status(plan_row.get::<String, _>("plan_status"))?,
            created_at: plan_row.get("created_at"),
            updated_at: plan_row.get("updated_at"),
            actions,
            rejection_details: parse_json_opt(plan_row.get::<Option<String>, _>("rejection_details"))?,
        }))
    }

    /// Invariant 3 (§8): a terminal plan never transitions again.
    pub async fn update_plan_status(
        &self,
        plan_id: &PlanId,
        status: PlanStatus,
        rejection_details: Option<serde_json::Value>,
        now_ms: i64,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let current = sqlx::query("SELECT plan_status FROM plans WHERE plan_id = ?")
            .bind(plan_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::PlanNotFound(plan_id.to_string()))?;

        let from = parse_plan_status(current.get::<String, _>("plan_status"))?;
        if from.is_terminal() {
            return Err(StorageError::InvalidPlanTransition {
                plan_id: plan_id.to_string(),
                from: from.to_string(),
                to: status.to_string(),
            });
        }

        sqlx::query(
            "UPDATE plans SET plan_status = ?, updated_at = ?, rejection_details = ? WHERE plan_id = ?",
        )
        .bind(status.to_string())
        .bind(now_ms)
        .bind(json_opt(&rejection_details)?)
        .bind(plan_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_action(
        &self,
        plan_id: &PlanId,
        action: &ActionState,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        if !row_exists(&self.pool, plan_id.as_str()).await? {
            return Err(StorageError::PlanNotFound(plan_id.to_string()));
        }
        let mut tx = self.pool.begin().await?;
        upsert_action(&mut tx, plan_id.as_str(), action).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Newest-first, paginated (spec.md §4.4).
    pub async fn list(
        &self,
        filter: PlanFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExecutionState>, StorageError> {
        let rows = if let Some(status) = filter.status {
            sqlx::query(
                "SELECT plan_id FROM plans WHERE plan_status = ? \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
            )
            .bind(status.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query("SELECT plan_id FROM plans ORDER BY created_at DESC LIMIT ? OFFSET ?")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
        };

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let plan_id = PlanId::new(row.get::<String, _>("plan_id"));
            if let Some(state) = self.get(&plan_id).await? {
                out.push(state);
            }
        }
        Ok(out)
    }

    /// Total rows matching `filter`, for pagination metadata alongside
    /// [`StateStore::list`].
    pub async fn count(&self, filter: PlanFilter) -> Result<i64, StorageError> {
        let row = if let Some(status) = filter.status {
            sqlx::query("SELECT COUNT(*) AS n FROM plans WHERE plan_status = ?")
                .bind(status.to_string())
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query("SELECT COUNT(*) AS n FROM plans").fetch_one(&self.pool).await?
        };
        Ok(row.get("n"))
    }

    /// Crash-recovery scan (spec.md §4.4): finds plans left non-terminal by
    /// an unclean shutdown. In-flight module dispatches cannot be safely
    /// replayed blind, so these are reported, not resumed — the caller
    /// marks them FAILED unless a human explicitly re-runs them.
    pub async fn recover_non_terminal(&self, now_ms: i64) -> Result<Vec<PlanId>, StorageError> {
        let rows = sqlx::query(
            "SELECT plan_id, plan_status FROM plans \
             WHERE plan_status NOT IN (?, ?, ?, ?)",
        )
        .bind(PlanStatus::Completed.to_string())
        .bind(PlanStatus::Failed.to_string())
        .bind(PlanStatus::Cancelled.to_string())
        .bind(PlanStatus::Rejected.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut recovered = Vec::with_capacity(rows.len());
        for row in rows {
            let plan_id = PlanId::new(row.get::<String, _>("plan_id"));
            self.update_plan_status(
                &plan_id,
                PlanStatus::Failed,
                Some(serde_json::json!({
                    "reason": "orphaned by unclean shutdown; not auto-resumed",
                })),
                now_ms,
            )
            .await?;
            recovered.push(plan_id);
        }
        Ok(recovered)
    }
}

async fn row_exists(pool: &SqlitePool, plan_id: &str) -> Result<bool, StorageError> {
    let row = sqlx::query("SELECT 1 FROM plans WHERE plan_id = ?")
        .bind(plan_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

async fn insert_action(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    plan_id: &str,
    action: &ActionState,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO actions (plan_id, action_id, status, started_at, finished_at, result, \
         error, attempt, alternatives, approval_metadata) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(plan_id)
    .bind(action.action_id.as_str())
    .bind(action.status.to_string())
    .bind(action.started_at)
    .bind(action.finished_at)
    .bind(json_opt(&action.result)?)
    .bind(&action.error)
    .bind(action.attempt as i64)
    .bind(serde_json::to_string(&action.alternatives)?)
    .bind(json_opt(&action.approval_metadata)?)
    .execute(&mut *tx)
    .await?;
    Ok(())
}

async fn upsert_action(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    plan_id: &str,
    action: &ActionState,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO actions (plan_id, action_id, status, started_at, finished_at, result, \
         error, attempt, alternatives, approval_metadata) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(plan_id, action_id) DO UPDATE SET \
         status = excluded.status, started_at = excluded.started_at, \
         finished_at = excluded.finished_at, result = excluded.result, \
         error = excluded.error, attempt = excluded.attempt, \
         alternatives = excluded.alternatives, approval_metadata = excluded.approval_metadata",
    )
    .bind(plan_id)
    .bind(action.action_id.as_str())
    .bind(action.status.to_string())
    .bind(action.started_at)
    .bind(action.finished_at)
    .bind(json_opt(&action.result)?)
    .bind(&action.error)
    .bind(action.attempt as i64)
    .bind(serde_json::to_string(&action.alternatives)?)
    .bind(json_opt(&action.approval_metadata)?)
    .execute(&mut *tx)
    .await?;
    Ok(())
}

fn json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>, StorageError> {
    value.as_ref().map(serde_json::to_string).transpose().map_err(StorageError::from)
}

fn parse_json_opt<T: serde::de::DeserializeOwned>(
    raw: Option<String>,
) -> Result<Option<T>, StorageError> {
    raw.map(|s| serde_json::from_str(&s)).transpose().map_err(StorageError::from)
}

fn parse_plan_status(raw: String) -> Result<PlanStatus, StorageError> {
    match raw.as_str() {
        "QUEUED" => Ok(PlanStatus::Queued),
        "RUNNING" => Ok(PlanStatus::Running),
        "COMPLETED" => Ok(PlanStatus::Completed),
        "FAILED" => Ok(PlanStatus::Failed),
        "CANCELLED" => Ok(PlanStatus::Cancelled),
        "REJECTED" => Ok(PlanStatus::Rejected),
        _ => Err(StorageError::InvalidData { column: "plan_status", value: raw }),
    }
}

fn parse_action_status(raw: String) -> Result<ActionStatus, StorageError> {
    match raw.as_str() {
        "PENDING" => Ok(ActionStatus::Pending),
        "RUNNING" => Ok(ActionStatus::Running),
        "COMPLETED" => Ok(ActionStatus::Completed),
        "FAILED" => Ok(ActionStatus::Failed),
        "SKIPPED" => Ok(ActionStatus::Skipped),
        "WAITING_APPROVAL" => Ok(ActionStatus::WaitingApproval),
        _ => Err(StorageError::InvalidData { column: "status", value: raw }),
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
