// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value memory collaborator (spec.md §6 `KeyValueStore`): backs
//! `{{memory.<key>}}` template resolution. In-process only — no
//! persistence across daemon restarts, matching spec.md's silence on
//! durability for this collaborator.

use iml_protocol::template::MemoryStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Default)]
pub struct KeyValueMemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyValueMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.entries.lock().insert(key.into(), Entry { value: value.into(), expires_at });
    }

    pub fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

impl MemoryStore for KeyValueMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at.is_some_and(|at| Instant::now() >= at) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
