// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template variable resolution (spec.md §4.2).
//!
//! Regex/`LazyLock` idiom grounded on the teacher's `crates/runbook/src/template.rs`,
//! adapted from `${var}` syntax to IML's `{{result.X.Y}}` mustache-style
//! placeholders.

use crate::error::ProtocolError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Matches a whole `{{...}}` placeholder, capturing the dotted path inside.
#[allow(clippy::expect_used)]
pub static TEMPLATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_.\-]*)\s*\}\}").expect("constant regex pattern is valid")
});

/// Matches only `{{result.<action_id>...}}` references, for the Validator's
/// "every template reference names an action that exists" check.
#[allow(clippy::expect_used)]
pub static RESULT_REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*result\.([a-zA-Z0-9_\-]+)(?:\.[a-zA-Z0-9_.\-]*)?\s*\}\}")
        .expect("constant regex pattern is valid")
});

/// Trigger-scope variables bound for a plan instantiated from a fired
/// trigger (spec.md §4.14 step 4, §4.15).
#[derive(Debug, Clone)]
pub struct TriggerScope {
    pub trigger_id: String,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub fired_at: i64,
}

/// Everything the Template Resolver needs to resolve one plan's params.
pub struct TemplateContext<'a> {
    /// `ExecutionResults` of the current plan: action_id -> result value.
    pub results: &'a std::collections::HashMap<String, Value>,
    pub memory: &'a dyn MemoryStore,
    pub allow_env_templates: bool,
    pub trigger: Option<&'a TriggerScope>,
}

/// Key-value memory store collaborator (spec.md §6 `KeyValueStore`).
pub trait MemoryStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Resolves every `{{...}}` placeholder in a params tree (spec.md §4.2).
/// Walks strings, lists, and nested maps recursively.
pub fn resolve_params(
    params: &std::collections::HashMap<String, Value>,
    ctx: &TemplateContext<'_>,
) -> Result<std::collections::HashMap<String, Value>, ProtocolError> {
    params
        .iter()
        .map(|(k, v)| resolve_value(v, ctx).map(|resolved| (k.clone(), resolved)))
        .collect()
}

fn resolve_value(value: &Value, ctx: &TemplateContext<'_>) -> Result<Value, ProtocolError> {
    match value {
        Value::String(s) => resolve_string(s, ctx),
        Value::Array(items) => {
            let resolved: Result<Vec<Value>, ProtocolError> =
                items.iter().map(|v| resolve_value(v, ctx)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, ctx)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_string(s: &str, ctx: &TemplateContext<'_>) -> Result<Value, ProtocolError> {
    // "If the template is the entire string value, the resolved value
    // replaces it verbatim preserving type" (spec.md §4.2).
    if let Some(caps) = TEMPLATE_PATTERN.captures(s) {
        if caps.get(0).map(|m| m.as_str()) == Some(s) {
            return resolve_reference(&caps[1], ctx);
        }
    }

    // Embedded inside a larger string: string-coerce and splice. Single
    // pass, left-to-right; replacements are not themselves re-scanned.
    let mut err = None;
    let spliced = TEMPLATE_PATTERN.replace_all(s, |caps: &regex::Captures| {
        if err.is_some() {
            return String::new();
        }
        match resolve_reference(&caps[1], ctx) {
            Ok(Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(e) => {
                err = Some(e);
                String::new()
            }
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    Ok(Value::String(spliced.to_string()))
}

fn resolve_reference(path: &str, ctx: &TemplateContext<'_>) -> Result<Value, ProtocolError> {
    let mut segments = path.splitn(2, '.');
    let scope = segments.next().unwrap_or_default();
    let rest = segments.next();

    match scope {
        "result" => resolve_result_reference(rest, ctx),
        "memory" => {
            let key = rest.ok_or_else(|| {
                ProtocolError::TemplateError("{{memory.*}} requires a key".to_string())
            })?;
            ctx.memory
                .get(key)
                .map(Value::String)
                .ok_or_else(|| ProtocolError::TemplateError(format!("memory key {key:?} not found")))
        }
        "env" => {
            if !ctx.allow_env_templates {
                return Err(ProtocolError::TemplateError(
                    "env templates disabled by permission profile".to_string(),
                ));
            }
            let var = rest.ok_or_else(|| {
                ProtocolError::TemplateError("{{env.*}} requires a variable name".to_string())
            })?;
            std::env::var(var)
                .map(Value::String)
                .map_err(|_| ProtocolError::TemplateError(format!("env var {var:?} not set")))
        }
        "trigger" => resolve_trigger_reference(rest, ctx),
        other => Err(ProtocolError::TemplateError(format!("unknown template scope {other:?}"))),
    }
}

fn resolve_result_reference(
    rest: Option<&str>,
    ctx: &TemplateContext<'_>,
) -> Result<Value, ProtocolError> {
    let rest = rest.ok_or_else(|| {
        ProtocolError::TemplateError("{{result.*}} requires an action id".to_string())
    })?;
    let mut parts = rest.splitn(2, '.');
    let action_id = parts.next().unwrap_or_default();
    let field = parts.next();

    let result = ctx
        .results
        .get(action_id)
        .ok_or_else(|| ProtocolError::TemplateError(format!("action {action_id:?} has no result yet")))?;

    match field {
        None => Ok(result.clone()),
        Some(field_path) => navigate_field(result, field_path).ok_or_else(|| {
            ProtocolError::TemplateError(format!("field {field_path:?} absent on result of {action_id:?}"))
        }),
    }
}

fn navigate_field(value: &Value, field_path: &str) -> Option<Value> {
    let mut current = value;
    for segment in field_path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

fn resolve_trigger_reference(
    rest: Option<&str>,
    ctx: &TemplateContext<'_>,
) -> Result<Value, ProtocolError> {
    let trigger = ctx
        .trigger
        .ok_or_else(|| ProtocolError::TemplateError("no trigger context bound to this plan".to_string()))?;
    let rest = rest.ok_or_else(|| {
        ProtocolError::TemplateError("{{trigger.*}} requires a field".to_string())
    })?;

    match rest {
        "trigger_id" => Ok(Value::String(trigger.trigger_id.clone())),
        "event_type" => Ok(Value::String(trigger.event_type.clone())),
        "fired_at" => Ok(Value::Number(trigger.fired_at.into())),
        other if other.starts_with("payload.") => {
            let key = &other["payload.".len()..];
            navigate_field(&Value::Object(trigger.payload.clone()), key)
                .ok_or_else(|| ProtocolError::TemplateError(format!("trigger payload key {key:?} absent")))
        }
        other => Err(ProtocolError::TemplateError(format!("unknown trigger field {other:?}"))),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
