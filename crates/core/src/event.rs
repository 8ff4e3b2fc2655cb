// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus wire types (spec.md §3 "EventRecord", §4.5).

use crate::ids::EventId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventPriority {
    Critical,
    High,
    Normal,
    Low,
    Background,
}

crate::simple_display! {
    EventPriority {
        Critical => "CRITICAL",
        High => "HIGH",
        Normal => "NORMAL",
        Low => "LOW",
        Background => "BACKGROUND",
    }
}

impl Default for EventPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Wire-level dict delivered to bus handlers (spec.md §3). Every bus stamps
/// `_topic` and `_timestamp` before delivery (§4.5); the rest of the fields
/// travel in `payload` so the wire format stays a flat map rather than a
/// closed enum of event kinds — new event kinds need no core change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "_topic")]
    pub topic: String,
    #[serde(rename = "_timestamp")]
    pub timestamp: i64,
    pub event: String,
    pub source: String,
    #[serde(rename = "_caused_by", default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<EventId>,
    #[serde(rename = "_session_id", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "_correlation_id", default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(rename = "_priority", default)]
    pub priority: EventPriority,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl EventRecord {
    pub fn new(topic: impl Into<String>, event: impl Into<String>, source: impl Into<String>, timestamp: i64) -> Self {
        Self {
            topic: topic.into(),
            timestamp,
            event: event.into(),
            source: source.into(),
            caused_by: None,
            session_id: None,
            correlation_id: None,
            priority: EventPriority::default(),
            payload: Map::new(),
        }
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Higher-level envelope adding causality tracking (spec.md §4.5).
/// Producers that need `_event_id`/`_causes` round-trip through this;
/// the wire format emitted by a bus is still the flat [`EventRecord`] map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversalEvent {
    #[serde(rename = "_event_id")]
    pub event_id: EventId,
    #[serde(flatten)]
    pub record: EventRecord,
    #[serde(rename = "_causes", default)]
    pub causes: Vec<EventId>,
}

impl UniversalEvent {
    pub fn new(record: EventRecord) -> Self {
        Self { event_id: EventId::new(), record, causes: Vec::new() }
    }

    pub fn caused_by(&self) -> Option<&EventId> {
        self.record.caused_by.as_ref()
    }

    pub fn causes(&self) -> &[EventId] {
        &self.causes
    }

    pub fn record_as_child_of(mut self, parent: &UniversalEvent) -> Self {
        self.record.caused_by = Some(parent.event_id.clone());
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
