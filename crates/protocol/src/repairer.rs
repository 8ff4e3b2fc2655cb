// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort JSON repair for LLM-authored plans (spec.md §4.1 "Repairer").

use crate::error::ProtocolError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*\n?(.*?)\n?```\s*$").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[^\n]*").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)"#).expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("constant regex pattern is valid"));

/// Result of [`repair`] (spec.md §4.1: "Returns `{parsed, transformations_applied, was_modified}`").
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub parsed: Value,
    pub transformations_applied: Vec<&'static str>,
    pub was_modified: bool,
}

/// Applies transformations in order, attempting a JSON parse after each
/// (spec.md §4.1 steps 1-7). Fails with [`ProtocolError::ParseError`] if
/// parsing still fails after all transformations.
pub fn repair(input: &str) -> Result<RepairOutcome, ProtocolError> {
    let mut text = input.to_string();
    let mut applied = Vec::new();

    if let Some(caps) = FENCE_PATTERN.captures(&text) {
        let inner = caps[1].to_string();
        if inner != text {
            text = inner;
            applied.push("strip_markdown_fence");
            if let Ok(parsed) = serde_json::from_str(&text) {
                return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
            }
        }
    }

    let without_block_comments = BLOCK_COMMENT.replace_all(&text, "").to_string();
    if without_block_comments != text {
        text = without_block_comments;
        applied.push("strip_block_comments");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    let without_line_comments = LINE_COMMENT.replace_all(&text, "").to_string();
    if without_line_comments != text {
        text = without_line_comments;
        applied.push("strip_line_comments");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    let python_literals = text
        .replace("True", "true")
        .replace("False", "false")
        .replace("None", "null");
    if python_literals != text {
        text = python_literals;
        applied.push("python_literals");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    let quoted_keys = BARE_KEY.replace_all(&text, r#"$1"$2"$3"#).to_string();
    if quoted_keys != text {
        text = quoted_keys;
        applied.push("quote_bare_keys");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    let double_quoted = single_to_double_quotes(&text);
    if double_quoted != text {
        text = double_quoted;
        applied.push("single_to_double_quotes");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    let no_trailing_commas = TRAILING_COMMA.replace_all(&text, "$1").to_string();
    if no_trailing_commas != text {
        text = no_trailing_commas;
        applied.push("strip_trailing_commas");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    let closed = close_unbalanced_brackets(&text);
    if closed != text {
        text = closed;
        applied.push("close_unbalanced_brackets");
        if let Ok(parsed) = serde_json::from_str(&text) {
            return Ok(RepairOutcome { parsed, transformations_applied: applied, was_modified: true });
        }
    }

    Err(ProtocolError::ParseError(format!(
        "JSON malformed after {} repair attempt(s)",
        applied.len()
    )))
}

/// Converts single-quoted string literals to double-quoted, leaving
/// apostrophes inside already-double-quoted strings untouched.
fn single_to_double_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_double = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if !in_double => {
                in_double = true;
                out.push(c);
            }
            '"' => {
                in_double = false;
                out.push(c);
            }
            '\'' if !in_double => out.push('"'),
            _ => out.push(c),
        }
    }
    out
}

fn close_unbalanced_brackets(text: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }
    let mut out = text.to_string();
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

#[cfg(test)]
#[path = "repairer_tests.rs"]
mod tests;
