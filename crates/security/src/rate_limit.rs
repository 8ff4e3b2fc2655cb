// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rate Limiter (spec.md §4.10): sliding-window request counters keyed by
//! `module.action`.

use crate::error::SecurityError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const WINDOW_HOUR: Duration = Duration::from_secs(3600);
const WINDOW_MINUTE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowCounts {
    pub minute: usize,
    pub hour: usize,
}

#[derive(Default)]
pub struct RateLimiter {
    // Timestamps within the last hour, pruned on every access.
    timestamps: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn prune(history: &mut Vec<Instant>, now: Instant) {
        history.retain(|t| now.duration_since(*t) <= WINDOW_HOUR);
    }

    pub fn get_counts(&self, key: &str) -> WindowCounts {
        let now = Instant::now();
        let mut guard = self.timestamps.lock();
        let history = guard.entry(key.to_string()).or_default();
        Self::prune(history, now);
        let minute = history.iter().filter(|t| now.duration_since(**t) <= WINDOW_MINUTE).count();
        WindowCounts { minute, hour: history.len() }
    }

    /// Raises [`SecurityError::RateLimitExceeded`] if recording one more
    /// call under `key` would exceed either configured limit, without
    /// recording it.
    pub fn check_or_raise(
        &self,
        key: &str,
        per_minute: Option<usize>,
        per_hour: Option<usize>,
    ) -> Result<(), SecurityError> {
        let counts = self.get_counts(key);
        if let Some(limit) = per_minute {
            if counts.minute >= limit {
                return Err(SecurityError::RateLimitExceeded {
                    key: key.to_string(),
                    limit: limit as u32,
                    window: "minute".to_string(),
                });
            }
        }
        if let Some(limit) = per_hour {
            if counts.hour >= limit {
                return Err(SecurityError::RateLimitExceeded {
                    key: key.to_string(),
                    limit: limit as u32,
                    window: "hour".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn record(&self, key: &str) {
        let now = Instant::now();
        let mut guard = self.timestamps.lock();
        let history = guard.entry(key.to_string()).or_default();
        Self::prune(history, now);
        history.push(now);
    }

    pub fn reset(&self, key: Option<&str>) {
        let mut guard = self.timestamps.lock();
        match key {
            Some(key) => {
                guard.remove(key);
            }
            None => guard.clear(),
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
