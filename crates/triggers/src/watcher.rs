// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition watchers (spec.md §4.14): each registered trigger gets one
//! independent `tokio::spawn`ed task that blocks on its condition and, when
//! satisfied, sends a [`FireEvent`] down the Trigger Daemon's channel.
//! The task never lets a panic/error escape its own loop — on an
//! unrecoverable error it sends a [`FireEvent::error`] and returns.

use iml_core::trigger::{CompositeOp, FilesystemEventKind, ResourceMetric, TriggerCondition};
use iml_core::TriggerId;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// What a watcher hands back to the daemon when its condition is satisfied
/// (or when the watcher itself has given up).
#[derive(Debug, Clone)]
pub struct FireEvent {
    pub trigger_id: TriggerId,
    pub event_type: String,
    pub payload: Map<String, Value>,
    /// `Some(reason)` means the watcher hit an unrecoverable error and its
    /// task is exiting; the daemon should move the trigger to FAILED rather
    /// than treat this as a normal condition match.
    pub watcher_error: Option<String>,
}

impl FireEvent {
    fn fired(trigger_id: TriggerId, event_type: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self { trigger_id, event_type: event_type.into(), payload, watcher_error: None }
    }

    fn error(trigger_id: TriggerId, reason: impl Into<String>) -> Self {
        Self { trigger_id, event_type: "watcher_error".to_string(), payload: Map::new(), watcher_error: Some(reason.into()) }
    }
}

/// How often a polling-style condition (PROCESS, RESOURCE, and the
/// once-a-minute TEMPORAL schedule check) re-checks itself.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A running watcher task. Dropping this without calling `stop()` leaves
/// the task running; callers should always `stop()` on deactivate/delete.
pub struct WatcherHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    /// Cancels the watcher's task and waits for it to wind down.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Spawns the independent task that evaluates `condition` and reports
/// through `tx` whenever it fires (spec.md §4.14 "Watcher contract").
pub fn spawn(trigger_id: TriggerId, condition: TriggerCondition, tx: UnboundedSender<FireEvent>) -> WatcherHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        if let Err(reason) = run_loop(&trigger_id, &condition, &tx, &task_cancel).await {
            let _ = tx.send(FireEvent::error(trigger_id, reason));
        }
    });
    WatcherHandle { cancel, task }
}

async fn run_loop(
    trigger_id: &TriggerId,
    condition: &TriggerCondition,
    tx: &UnboundedSender<FireEvent>,
    cancel: &CancellationToken,
) -> Result<(), String> {
    match condition {
        TriggerCondition::Temporal { interval_seconds: Some(secs), .. } => {
            let mut tick = tokio::time::interval(Duration::from_secs((*secs).max(1)));
            tick.tick().await; // first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tick.tick() => {
                        let _ = tx.send(FireEvent::fired(trigger_id.clone(), "temporal.interval", Map::new()));
                    }
                }
            }
        }
        TriggerCondition::Temporal { run_at: Some(ts), .. } => {
            let now = chrono::Utc::now().timestamp_millis();
            let delay = (*ts - now).max(0) as u64;
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {
                    let _ = tx.send(FireEvent::fired(trigger_id.clone(), "temporal.run_at", Map::new()));
                }
            }
            Ok(())
        }
        TriggerCondition::Temporal { schedule: Some(expr), .. } => {
            let cron = CronSchedule::parse(expr).map_err(|e| format!("invalid cron schedule {expr:?}: {e}"))?;
            let mut last_fired_minute = None;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                }
                let now = chrono::Local::now();
                let minute_key = now.timestamp() / 60;
                if Some(minute_key) != last_fired_minute && cron.matches(&now) {
                    last_fired_minute = Some(minute_key);
                    let _ = tx.send(FireEvent::fired(trigger_id.clone(), "temporal.schedule", Map::new()));
                }
            }
        }
        TriggerCondition::Temporal { .. } => Err("temporal condition names no interval/run_at/schedule".to_string()),

        TriggerCondition::Filesystem { path, events } => watch_filesystem(trigger_id, path, events, tx, cancel).await,

        TriggerCondition::Process { process_name, present } => {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                }
                let found = process_running(process_name).await?;
                if found == *present {
                    let mut payload = Map::new();
                    payload.insert("process_name".to_string(), Value::String(process_name.clone()));
                    let _ = tx.send(FireEvent::fired(trigger_id.clone(), "process", payload));
                }
            }
        }

        TriggerCondition::Resource { metric, threshold } => {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                }
                let value = sample_resource(*metric)?;
                if value >= *threshold {
                    let mut payload = Map::new();
                    payload.insert("metric".to_string(), Value::String(format!("{metric:?}")));
                    payload.insert("value".to_string(), serde_json::json!(value));
                    let _ = tx.send(FireEvent::fired(trigger_id.clone(), "resource", payload));
                }
            }
        }

        TriggerCondition::Composite { op, conditions } => {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                }
                if evaluate_composite(*op, conditions).await? {
                    let _ = tx.send(FireEvent::fired(trigger_id.clone(), "composite", Map::new()));
                }
            }
        }
    }
}

/// One-shot poll of a condition tree, used by COMPOSITE. Conditions with
/// their own event-driven semantics (FILESYSTEM) degrade to "did the event
/// fire at all since last poll" here, which is the best a synchronous
/// snapshot check can offer.
async fn evaluate_leaf(condition: &TriggerCondition) -> Result<bool, String> {
    match condition {
        TriggerCondition::Temporal { run_at: Some(ts), .. } => Ok(chrono::Utc::now().timestamp_millis() >= *ts),
        TriggerCondition::Temporal { schedule: Some(expr), .. } => {
            let cron = CronSchedule::parse(expr).map_err(|e| format!("invalid cron schedule {expr:?}: {e}"))?;
            Ok(cron.matches(&chrono::Local::now()))
        }
        TriggerCondition::Temporal { .. } => Ok(false),
        TriggerCondition::Filesystem { .. } => Ok(false),
        TriggerCondition::Process { process_name, present } => Ok(process_running(process_name).await? == *present),
        TriggerCondition::Resource { metric, threshold } => Ok(sample_resource(*metric)? >= *threshold),
        TriggerCondition::Composite { op, conditions } => {
            Box::pin(evaluate_composite(*op, conditions)).await
        }
    }
}

async fn evaluate_composite(op: CompositeOp, conditions: &[TriggerCondition]) -> Result<bool, String> {
    match op {
        CompositeOp::And => {
            for c in conditions {
                if !evaluate_leaf(c).await? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        CompositeOp::Or => {
            for c in conditions {
                if evaluate_leaf(c).await? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

async fn watch_filesystem(
    trigger_id: &TriggerId,
    path: &str,
    events: &[FilesystemEventKind],
    tx: &UnboundedSender<FireEvent>,
    cancel: &CancellationToken,
) -> Result<(), String> {
    use notify::{Event, RecursiveMode, Watcher};

    let (raw_tx, mut raw_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            let _ = raw_tx.send(event);
        }
    })
    .map_err(|e| format!("failed to start filesystem watcher: {e}"))?;
    watcher
        .watch(&PathBuf::from(path), RecursiveMode::Recursive)
        .map_err(|e| format!("failed to watch {path}: {e}"))?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            maybe_event = raw_rx.recv() => {
                let Some(event) = maybe_event else { return Ok(()) };
                if let Some(kind) = matching_event_kind(&event.kind, events) {
                    let mut payload = Map::new();
                    payload.insert("path".to_string(), Value::String(path.to_string()));
                    payload.insert(
                        "paths".to_string(),
                        Value::Array(event.paths.iter().map(|p| Value::String(p.display().to_string())).collect()),
                    );
                    let _ = tx.send(FireEvent::fired(trigger_id.clone(), format!("filesystem.{kind}"), payload));
                }
            }
        }
    }
}

fn matching_event_kind(kind: &notify::EventKind, wanted: &[FilesystemEventKind]) -> Option<&'static str> {
    use notify::EventKind;
    let matched = match kind {
        EventKind::Create(_) if wanted.contains(&FilesystemEventKind::Created) => "created",
        EventKind::Modify(_) if wanted.contains(&FilesystemEventKind::Modified) => "modified",
        EventKind::Remove(_) if wanted.contains(&FilesystemEventKind::Deleted) => "deleted",
        _ => return None,
    };
    Some(matched)
}

/// Best-effort: scans `/proc/*/comm` for a matching process name. Linux-only;
/// on any other platform this always reports "not found" rather than erroring
/// the whole watcher, since process presence is advisory here.
async fn process_running(process_name: &str) -> Result<bool, String> {
    #[cfg(target_os = "linux")]
    {
        let mut entries = tokio::fs::read_dir("/proc").await.map_err(|e| format!("reading /proc: {e}"))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| e.to_string())? {
            if !entry.file_name().to_string_lossy().chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let comm_path = entry.path().join("comm");
            if let Ok(comm) = tokio::fs::read_to_string(&comm_path).await {
                if comm.trim() == process_name {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = process_name;
        Ok(false)
    }
}

/// Samples one resource metric as a 0.0-1.0 fraction. CPU is approximated
/// from `/proc/loadavg`'s 1-minute load average divided by the logical CPU
/// count; memory and disk come from `/proc/meminfo` and `statvfs` on the
/// root filesystem. Linux-only; other platforms always read 0.0.
fn sample_resource(metric: ResourceMetric) -> Result<f64, String> {
    #[cfg(target_os = "linux")]
    {
        match metric {
            ResourceMetric::Cpu => {
                let loadavg = std::fs::read_to_string("/proc/loadavg").map_err(|e| e.to_string())?;
                let one_min: f64 = loadavg
                    .split_whitespace()
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| "unparsable /proc/loadavg".to_string())?;
                let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) as f64;
                Ok((one_min / cpus).min(1.0))
            }
            ResourceMetric::Memory => {
                let meminfo = std::fs::read_to_string("/proc/meminfo").map_err(|e| e.to_string())?;
                let mut total = None;
                let mut available = None;
                for line in meminfo.lines() {
                    if let Some(rest) = line.strip_prefix("MemTotal:") {
                        total = rest.trim().trim_end_matches(" kB").trim().parse::<f64>().ok();
                    } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                        available = rest.trim().trim_end_matches(" kB").trim().parse::<f64>().ok();
                    }
                }
                let (total, available) =
                    (total.ok_or("no MemTotal")?, available.ok_or("no MemAvailable")?);
                Ok(((total - available) / total).clamp(0.0, 1.0))
            }
            ResourceMetric::Disk => {
                let stat = nix::sys::statvfs::statvfs("/").map_err(|e| e.to_string())?;
                let total = stat.blocks() as f64;
                let free = stat.blocks_available() as f64;
                if total == 0.0 {
                    return Ok(0.0);
                }
                Ok(((total - free) / total).clamp(0.0, 1.0))
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = metric;
        Ok(0.0)
    }
}

/// Minimal 5-field cron matcher (`minute hour day-of-month month
/// day-of-week`), supporting `*` and exact numeric values. Enough for the
/// periodic schedules trigger definitions actually use; full cron range/step
/// syntax is out of scope.
struct CronSchedule {
    minute: Option<u32>,
    hour: Option<u32>,
    day_of_month: Option<u32>,
    month: Option<u32>,
    day_of_week: Option<u32>,
}

impl CronSchedule {
    fn parse(expr: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err("expected 5 whitespace-separated fields".to_string());
        }
        let field = |s: &str| -> Result<Option<u32>, String> {
            if s == "*" {
                Ok(None)
            } else {
                s.parse().map(Some).map_err(|_| format!("not a number: {s:?}"))
            }
        };
        Ok(Self {
            minute: field(fields[0])?,
            hour: field(fields[1])?,
            day_of_month: field(fields[2])?,
            month: field(fields[3])?,
            day_of_week: field(fields[4])?,
        })
    }

    fn matches(&self, now: &chrono::DateTime<chrono::Local>) -> bool {
        use chrono::{Datelike, Timelike};
        self.minute.map_or(true, |m| m == now.minute())
            && self.hour.map_or(true, |h| h == now.hour())
            && self.day_of_month.map_or(true, |d| d == now.day())
            && self.month.map_or(true, |m| m == now.month())
            && self.day_of_week.map_or(true, |d| d == now.weekday().num_days_from_sunday())
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
