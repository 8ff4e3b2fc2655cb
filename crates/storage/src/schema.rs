// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema bootstrap for the embedded SQLite store (spec.md §4.4).
//!
//! `plans`/`actions` mirror [`iml_core::state::ExecutionState`] and
//! [`iml_core::state::ActionState`]; `triggers` mirrors
//! [`iml_core::trigger::TriggerDefinition`]. Every column that holds a
//! nested structure (params, result, health, ...) is stored as a JSON text
//! blob rather than normalised further, the same tradeoff the params/config
//! columns in the rest of this table make.

use sqlx::SqlitePool;

pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            plan_id TEXT PRIMARY KEY,
            plan_status TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            rejection_details TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actions (
            plan_id TEXT NOT NULL REFERENCES plans(plan_id) ON DELETE CASCADE,
            action_id TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at INTEGER,
            finished_at INTEGER,
            result TEXT,
            error TEXT,
            attempt INTEGER NOT NULL DEFAULT 1,
            alternatives TEXT NOT NULL DEFAULT '[]',
            approval_metadata TEXT,
            PRIMARY KEY (plan_id, action_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_status ON plans(plan_status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_created ON plans(created_at DESC)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS triggers (
            trigger_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            definition TEXT NOT NULL,
            state TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
pub(crate) mod tests;
