// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT-style pattern routing over an [`EventBus`] (spec.md §4.5).
//!
//! `*` matches exactly one path segment; `#` matches zero or more segments
//! at any depth. A route with no wildcards is a literal topic comparison.

use crate::bus::EventBus;
use async_trait::async_trait;
use iml_core::event::EventRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Returns whether `topic` matches the MQTT-style `pattern`.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    if !pattern.contains('*') && !pattern.contains('#') {
        return pattern == topic;
    }
    let pattern_segments: Vec<&str> = pattern.split('.').collect();
    let topic_segments: Vec<&str> = topic.split('.').collect();
    match_segments(&pattern_segments, &topic_segments)
}

fn match_segments(pattern: &[&str], topic: &[&str]) -> bool {
    match pattern.first() {
        None => topic.is_empty(),
        // "#" matches the rest of the topic, including nothing at all.
        Some(&"#") => true,
        Some(&"*") => !topic.is_empty() && match_segments(&pattern[1..], &topic[1..]),
        Some(segment) => topic.first() == Some(segment) && match_segments(&pattern[1..], &topic[1..]),
    }
}

struct Route {
    pattern: String,
    handler: Arc<dyn EventBus>,
}

/// Holds `(pattern, handler)` pairs checked in registration order. Every
/// matching handler receives the event; unmatched events fall through to
/// an optional fallback bus.
pub struct EventRouter {
    routes: RwLock<Vec<Route>>,
    fallback: Option<Arc<dyn EventBus>>,
}

impl EventRouter {
    pub fn new(fallback: Option<Arc<dyn EventBus>>) -> Self {
        Self { routes: RwLock::new(Vec::new()), fallback }
    }

    pub fn add_route(&self, pattern: impl Into<String>, handler: Arc<dyn EventBus>) {
        self.routes.write().push(Route { pattern: pattern.into(), handler });
    }

    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }
}

#[async_trait]
impl EventBus for EventRouter {
    async fn emit(&self, record: EventRecord) {
        let matching: Vec<Arc<dyn EventBus>> = {
            let routes = self.routes.read();
            routes
                .iter()
                .filter(|route| topic_matches(&route.pattern, &record.topic))
                .map(|route| route.handler.clone())
                .collect()
        };

        if matching.is_empty() {
            if let Some(fallback) = &self.fallback {
                fallback.emit(record).await;
            }
            return;
        }

        for handler in matching {
            let record = record.clone();
            // A handler is untrusted third-party code from the router's
            // point of view; isolate a panic so it never reaches the
            // producer that called emit().
            if let Err(err) = tokio::spawn(async move { handler.emit(record).await }).await {
                tracing::error!(error = %err, "event_router_handler_panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
