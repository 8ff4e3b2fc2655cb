// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output Sanitiser (spec.md §4.8).

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Object keys known to carry opaque binary/base64 payloads that must pass
/// through untouched (spec.md §4.8).
const BINARY_PASSTHROUGH_KEYS: &[&str] = &["screenshot_b64", "labeled_image_b64", "image_b64"];

static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ignore (all )?(previous|prior|above) instructions",
        r"(?i)disregard (all )?(previous|prior|above) (instructions|rules)",
        r"(?i)you are now (in )?(developer|dan|jailbreak) mode",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in sanitiser pattern compiles"))
    .collect()
});

#[derive(Debug, Clone)]
pub struct SanitiserConfig {
    pub max_str_len: usize,
    pub max_depth: usize,
    pub max_list_items: usize,
}

impl Default for SanitiserConfig {
    fn default() -> Self {
        Self { max_str_len: 50_000, max_depth: 10, max_list_items: 1_000 }
    }
}

/// Normalises, redacts, and bounds a module's raw output value before it
/// is handed back to the model.
pub fn sanitise(value: &Value, config: &SanitiserConfig) -> Value {
    sanitise_at(value, config, 0)
}

fn sanitise_at(value: &Value, config: &SanitiserConfig, depth: usize) -> Value {
    if depth >= config.max_depth {
        return Value::String("[TRUNCATED: max depth exceeded]".to_string());
    }
    match value {
        Value::String(s) => Value::String(sanitise_string(s, config)),
        Value::Array(items) => {
            let truncated = items.len() > config.max_list_items;
            let mut out: Vec<Value> =
                items.iter().take(config.max_list_items).map(|v| sanitise_at(v, config, depth + 1)).collect();
            if truncated {
                out.push(Value::String(format!(
                    "[TRUNCATED: {} items omitted]",
                    items.len() - config.max_list_items
                )));
            }
            Value::Array(out)
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                if BINARY_PASSTHROUGH_KEYS.contains(&key.as_str()) {
                    out.insert(key.clone(), val.clone());
                } else {
                    out.insert(key.clone(), sanitise_at(val, config, depth + 1));
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn sanitise_string(s: &str, config: &SanitiserConfig) -> String {
    let normalised: String = s.nfkc().collect();
    let mut redacted = normalised;
    for pattern in INJECTION_PATTERNS.iter() {
        if pattern.is_match(&redacted) {
            redacted = pattern.replace_all(&redacted, "[REDACTED:injection-pattern]").to_string();
        }
    }
    let char_count = redacted.chars().count();
    if char_count > config.max_str_len {
        truncate_with_marker(&redacted, char_count, config.max_str_len)
    } else {
        redacted
    }
}

/// Truncates `s` (known to be `char_count` chars long) so the
/// "[TRUNCATED: N chars omitted]" marker fits inside `max_str_len` rather
/// than being appended on top of a full `max_str_len` of kept content,
/// which would make the result longer than `max_str_len` and break
/// `sanitise(sanitise(x)) == sanitise(x)` (spec.md §8). Converges in a few
/// iterations: `kept` only shrinks to make room for a longer marker, and
/// the marker's digit count only grows as `kept` shrinks.
fn truncate_with_marker(s: &str, char_count: usize, max_str_len: usize) -> String {
    let mut kept = max_str_len;
    loop {
        let omitted = char_count - kept;
        let marker = format!("[TRUNCATED: {omitted} chars omitted]");
        let budget = max_str_len.saturating_sub(marker.chars().count());
        if budget >= kept {
            let truncated: String = s.chars().take(kept).collect();
            return format!("{truncated}{marker}");
        }
        kept = budget;
    }
}

#[cfg(test)]
#[path = "sanitiser_tests.rs"]
mod tests;
