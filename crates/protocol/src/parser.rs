// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan parsing entry point (spec.md §4.1 "Parser").
//!
//! Tries a strict JSON decode first; on failure falls back to
//! [`crate::repairer::repair`]. Module/action names are not checked against
//! a live registry here — "unknown module or action is not a parse-time
//! error" (spec.md §4.1) since the registry may not be loaded yet.

use crate::error::ProtocolError;
use crate::repairer::{self, RepairOutcome};
use crate::validator;
use iml_core::plan::IMLPlan;
use tracing::{debug, warn};

/// Outcome of [`parse`]: the decoded plan plus whatever repair bookkeeping
/// happened along the way, for audit logging and correction-prompt
/// formatting.
#[derive(Debug)]
pub struct ParseOutcome {
    pub plan: IMLPlan,
    pub was_repaired: bool,
    pub transformations_applied: Vec<&'static str>,
}

/// Parses raw LLM output into a validated [`IMLPlan`].
///
/// Order: strict decode -> repair-and-retry -> structural validation.
/// Structural validation (spec.md §4.1 "Validator") always runs, whether or
/// not repair was needed, since a syntactically valid plan can still be
/// semantically broken (cycles, dangling dependencies, ...).
pub fn parse(raw: &str) -> Result<ParseOutcome, ProtocolError> {
    let (value, was_repaired, transformations_applied) = match serde_json::from_str(raw) {
        Ok(value) => (value, false, Vec::new()),
        Err(strict_err) => {
            debug!(error = %strict_err, "strict JSON decode failed, attempting repair");
            let RepairOutcome { parsed, transformations_applied, was_modified } =
                repairer::repair(raw)?;
            if was_modified {
                warn!(transformations = ?transformations_applied, "plan JSON required repair");
            }
            (parsed, was_modified, transformations_applied)
        }
    };

    let plan: IMLPlan = serde_json::from_value(value)
        .map_err(|e| ProtocolError::ParseError(format!("plan does not match IML shape: {e}")))?;

    validator::validate(&plan)?;

    Ok(ParseOutcome { plan, was_repaired, transformations_applied })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
