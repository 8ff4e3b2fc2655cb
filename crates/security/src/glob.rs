// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glob-style pattern matching for permission allow/deny lists (spec.md §4.6:
//! "Pattern matching uses glob semantics: `module.*` matches any action
//! within `module`, `*.*` matches everything").

use regex::Regex;

/// Compiles a glob pattern (`*` = any sequence of characters) into an
/// anchored regex.
pub fn glob_to_regex(pattern: &str) -> Regex {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    for part in pattern.split('*') {
        if !out.ends_with('^') {
            out.push_str(".*");
        }
        out.push_str(&regex::escape(part));
    }
    out.push('$');
    // Patterns are authored by the daemon operator (permission profiles),
    // not by untrusted input, so a compile failure here is a configuration
    // bug rather than a runtime condition to recover from.
    #[allow(clippy::expect_used)]
    Regex::new(&out).expect("glob pattern compiles to a valid regex")
}

pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    glob_to_regex(pattern).is_match(candidate)
}

#[cfg(test)]
#[path = "glob_tests.rs"]
mod tests;
