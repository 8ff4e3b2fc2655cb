// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger Store (spec.md §4.14): durable CRUD over [`TriggerDefinition`].
//!
//! The whole definition (condition tree, plan template, throttling knobs,
//! health counters) round-trips as one JSON blob; `state`/`enabled` are
//! broken out into their own columns since the daemon filters and updates
//! them independently of the rest of the definition.

use crate::error::StorageError;
use iml_core::{TriggerDefinition, TriggerId, TriggerState};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

pub struct TriggerStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl TriggerStore {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new().max_connections(1).connect(database_url).await?;
        crate::schema::init(&pool).await?;
        Ok(Self { pool, write_lock: Mutex::new(()) })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, write_lock: Mutex::new(()) }
    }

    pub async fn create(
        &self,
        trigger: &TriggerDefinition,
        now_ms: i64,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query(
            "INSERT INTO triggers (trigger_id, name, definition, state, enabled, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(trigger.trigger_id.as_str())
        .bind(&trigger.name)
        .bind(serde_json::to_string(trigger)?)
        .bind(trigger.state.to_string())
        .bind(trigger.enabled)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, trigger_id: &TriggerId) -> Result<Option<TriggerDefinition>, StorageError> {
        let row = sqlx::query("SELECT definition FROM triggers WHERE trigger_id = ?")
            .bind(trigger_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_str(&r.get::<String, _>("definition")))
            .transpose()
            .map_err(StorageError::from)
    }

    pub async fn update(&self, trigger: &TriggerDefinition, now_ms: i64) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let changed = sqlx::query(
            "UPDATE triggers SET name = ?, definition = ?, state = ?, enabled = ?, updated_at = ? \
             WHERE trigger_id = ?",
        )
        .bind(&trigger.name)
        .bind(serde_json::to_string(trigger)?)
        .bind(trigger.state.to_string())
        .bind(trigger.enabled)
        .bind(now_ms)
        .bind(trigger.trigger_id.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if changed == 0 {
            return Err(StorageError::TriggerNotFound(trigger.trigger_id.to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, trigger_id: &TriggerId) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let changed = sqlx::query("DELETE FROM triggers WHERE trigger_id = ?")
            .bind(trigger_id.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if changed == 0 {
            return Err(StorageError::TriggerNotFound(trigger_id.to_string()));
        }
        Ok(())
    }

    /// Triggers a watcher should actively arm: enabled and not REGISTERED.
    pub async fn list_enabled(&self) -> Result<Vec<TriggerDefinition>, StorageError> {
        let rows = sqlx::query("SELECT definition FROM triggers WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| serde_json::from_str(&r.get::<String, _>("definition")).map_err(StorageError::from))
            .collect()
    }

    pub async fn list_all(&self) -> Result<Vec<TriggerDefinition>, StorageError> {
        let rows = sqlx::query("SELECT definition FROM triggers").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| serde_json::from_str(&r.get::<String, _>("definition")).map_err(StorageError::from))
            .collect()
    }

    pub async fn set_state(
        &self,
        trigger_id: &TriggerId,
        state: TriggerState,
        now_ms: i64,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut trigger = self
            .get(trigger_id)
            .await?
            .ok_or_else(|| StorageError::TriggerNotFound(trigger_id.to_string()))?;
        trigger.state = state;
        drop(_guard);
        self.update(&trigger, now_ms).await
    }
}

#[cfg(test)]
#[path = "trigger_store_tests.rs"]
mod tests;
