// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Bus interface and the Null/Log/Fanout implementations
//! (spec.md §4.5).

use async_trait::async_trait;
use iml_core::event::EventRecord;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// `emit` must never raise — backend errors are logged and swallowed, so a
/// bus outage never propagates into the action execution path.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn emit(&self, record: EventRecord);
}

/// Discards everything. Default backend so producers never need to check
/// whether a bus is configured.
pub struct NullEventBus;

#[async_trait]
impl EventBus for NullEventBus {
    async fn emit(&self, _record: EventRecord) {}
}

/// Appends one NDJSON line per event to a file, serialising concurrent
/// writers behind an async mutex.
pub struct LogEventBus {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LogEventBus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }
}

#[async_trait]
impl EventBus for LogEventBus {
    async fn emit(&self, record: EventRecord) {
        let line = match serde_json::to_string(&record) {
            Ok(mut s) => {
                s.push('\n');
                s
            }
            Err(err) => {
                tracing::error!(topic = %record.topic, error = %err, "event_bus_serialise_failed");
                return;
            }
        };

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                tracing::error!(topic = %record.topic, error = %err, "event_bus_mkdir_failed");
                return;
            }
        }
        let file = tokio::fs::OpenOptions::new().create(true).append(true).open(&self.path).await;
        match file {
            Ok(mut file) => {
                if let Err(err) = file.write_all(line.as_bytes()).await {
                    tracing::error!(topic = %record.topic, error = %err, "event_bus_write_failed");
                }
            }
            Err(err) => {
                tracing::error!(topic = %record.topic, error = %err, "event_bus_open_failed");
            }
        }
    }
}

/// Delivers each event to every child bus concurrently; a child's failure
/// to emit never affects its siblings (errors are already swallowed by
/// each child per the `EventBus` contract).
pub struct FanoutEventBus {
    backends: Vec<Arc<dyn EventBus>>,
}

impl FanoutEventBus {
    pub fn new(backends: Vec<Arc<dyn EventBus>>) -> Self {
        Self { backends }
    }
}

#[async_trait]
impl EventBus for FanoutEventBus {
    async fn emit(&self, record: EventRecord) {
        let handles: Vec<_> = self
            .backends
            .iter()
            .cloned()
            .map(|backend| {
                let record = record.clone();
                tokio::spawn(async move { backend.emit(record).await })
            })
            .collect();
        for handle in handles {
            // A child task panicking must not take the whole fanout down;
            // log and move on (mirrors the "isolate each child's errors"
            // requirement for this bus).
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "event_bus_fanout_child_panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
