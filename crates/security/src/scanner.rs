// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner Pipeline (spec.md §4.7).

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanVerdict {
    Allow,
    Warn,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub scanner: String,
    pub verdict: ScanVerdict,
    pub risk_score: f64,
    pub threat_types: Vec<String>,
    pub matched_patterns: Vec<String>,
    pub details: String,
    pub scan_duration_ms: f64,
}

/// Plan-level context handed to every scanner alongside the serialised plan
/// JSON (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub plan_id: String,
    pub description: String,
    pub action_count: usize,
    pub module_ids: Vec<String>,
    pub session_id: Option<String>,
}

/// A single input scanner, run in priority order (lower runs first).
/// Inspects flattened plan text (see [`flatten_for_scan`]) plus its
/// context, never the raw struct — this is the boundary untrusted plan
/// content crosses.
pub trait InputScanner: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> i32;
    fn scan(&self, plan_json: &str, context: &ScanContext) -> ScanResult;
}

/// Flattens a decoded plan value into scannable text: every leaf scalar
/// (string, number, bool) is joined with a single space in document order,
/// so array-form content like `["rm", "-rf", "/"]` reads as `rm -rf /`
/// instead of being split across pretty-printed quotes/commas/newlines
/// that a whitespace-only pattern can't bridge. Object keys are not
/// included, only values.
pub fn flatten_for_scan(value: &Value) -> String {
    let mut out = String::new();
    flatten_into(value, &mut out);
    out
}

fn flatten_into(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::Bool(b) => push_token(out, &b.to_string()),
        Value::Number(n) => push_token(out, &n.to_string()),
        Value::String(s) => push_token(out, s),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                flatten_into(v, out);
            }
        }
    }
}

fn push_token(out: &mut String, token: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(token);
}

pub struct ScannerConfig {
    pub fail_fast: bool,
    pub reject_threshold: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self { fail_fast: false, reject_threshold: 0.9 }
    }
}

pub struct ScannerPipeline {
    scanners: Vec<Box<dyn InputScanner>>,
    config: ScannerConfig,
}

impl ScannerPipeline {
    pub fn new(config: ScannerConfig) -> Self {
        Self { scanners: Vec::new(), config }
    }

    pub fn register(&mut self, scanner: Box<dyn InputScanner>) {
        self.scanners.push(scanner);
        self.scanners.sort_by_key(|s| s.priority());
    }

    /// Runs every registered scanner over the serialised plan and
    /// aggregates their verdicts: REJECT if any scanner rejects (or
    /// `max_risk_score` crosses `reject_threshold`), WARN if any warns
    /// and none rejects, ALLOW otherwise. A scanner that panics is
    /// treated as a WARN rather than aborting the whole pipeline.
    pub fn run(&self, plan_json: &str, context: &ScanContext) -> (ScanVerdict, Vec<ScanResult>) {
        let mut results = Vec::with_capacity(self.scanners.len());
        let mut worst = ScanVerdict::Allow;
        let mut max_risk: f64 = 0.0;

        for scanner in &self.scanners {
            let started = Instant::now();
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| scanner.scan(plan_json, context)));
            let result = match outcome {
                Ok(mut r) => {
                    r.scan_duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                    r
                }
                Err(_) => ScanResult {
                    scanner: scanner.name().to_string(),
                    verdict: ScanVerdict::Warn,
                    risk_score: 0.0,
                    threat_types: vec![],
                    matched_patterns: vec![],
                    details: "scanner error: panicked".to_string(),
                    scan_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                },
            };

            max_risk = max_risk.max(result.risk_score);
            if result.verdict > worst {
                worst = result.verdict;
            }
            let reject_now = worst == ScanVerdict::Reject || max_risk >= self.config.reject_threshold;
            results.push(result);
            if reject_now {
                worst = ScanVerdict::Reject;
                if self.config.fail_fast {
                    break;
                }
            }
        }

        (worst, results)
    }
}

static PROMPT_INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ignore (all )?(previous|prior|above) instructions",
        r"(?i)disregard (all )?(previous|prior|above) (instructions|rules)",
        r"(?i)you are now (in )?(developer|dan|jailbreak) mode",
        r"(?i)reveal (your|the) system prompt",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in prompt-injection pattern compiles"))
    .collect()
});

static DESTRUCTIVE_SHELL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"rm\s+-rf\s+/",
        r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;",
        r"mkfs\.",
        r"dd\s+if=.*of=/dev/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in destructive-shell pattern compiles"))
    .collect()
});

static CREDENTIAL_EXFIL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(aws_secret_access_key|api[_-]?key|private[_-]?key)\s*[:=]",
        r"(?i)-----BEGIN (RSA |EC )?PRIVATE KEY-----",
        r"(?i)curl .*\|\s*(sh|bash)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("built-in credential-exfiltration pattern compiles"))
    .collect()
});

/// Regex-based heuristic scanner covering prompt injection, destructive
/// shell commands, and credential exfiltration shapes (spec.md §4.7).
pub struct HeuristicScanner;

impl InputScanner for HeuristicScanner {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn scan(&self, plan_json: &str, _context: &ScanContext) -> ScanResult {
        let mut threat_types = Vec::new();
        let mut matched_patterns = Vec::new();
        let mut risk_score: f64 = 0.0;

        for re in PROMPT_INJECTION_PATTERNS.iter() {
            if let Some(m) = re.find(plan_json) {
                threat_types.push("prompt_injection".to_string());
                matched_patterns.push(m.as_str().to_string());
                risk_score = risk_score.max(0.6);
            }
        }
        for re in DESTRUCTIVE_SHELL_PATTERNS.iter() {
            if let Some(m) = re.find(plan_json) {
                threat_types.push("destructive_command".to_string());
                matched_patterns.push(m.as_str().to_string());
                risk_score = risk_score.max(0.95);
            }
        }
        for re in CREDENTIAL_EXFIL_PATTERNS.iter() {
            if let Some(m) = re.find(plan_json) {
                threat_types.push("credential_exfiltration".to_string());
                matched_patterns.push(m.as_str().to_string());
                risk_score = risk_score.max(0.8);
            }
        }

        let verdict = if risk_score >= 0.9 {
            ScanVerdict::Reject
        } else if risk_score > 0.0 {
            ScanVerdict::Warn
        } else {
            ScanVerdict::Allow
        };

        ScanResult {
            scanner: self.name().to_string(),
            verdict,
            risk_score,
            threat_types,
            matched_patterns,
            details: String::new(),
            scan_duration_ms: 0.0,
        }
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
