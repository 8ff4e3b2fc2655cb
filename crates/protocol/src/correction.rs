// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correction-prompt formatting for failed plan parses (SPEC_FULL.md §C.3).
//!
//! When a plan is rejected, the daemon hands the offending LLM a short,
//! actionable message it can fold straight back into its next turn rather
//! than a raw Rust error.

use crate::error::ProtocolError;

/// Formats a [`ProtocolError`] as a prompt fragment to send back to the
/// plan-authoring LLM, naming the defect and the fix expected of it.
pub fn correction_prompt(err: &ProtocolError) -> String {
    match err {
        ProtocolError::ParseError(detail) => format!(
            "Your plan was not valid JSON and could not be repaired automatically ({detail}). \
             Resend the plan as a single JSON object with no surrounding prose."
        ),
        ProtocolError::ValidationError(detail) => format!(
            "Your plan is structurally invalid: {detail}. Fix the referenced action(s) and resend \
             the whole plan."
        ),
        ProtocolError::DagCycle(nodes) => format!(
            "Your plan's actions form a dependency cycle: {}. Remove or reorder depends_on entries \
             so the actions form a DAG.",
            nodes.join(" -> ")
        ),
        ProtocolError::UnknownTemplateReference(action_id) => format!(
            "A template reference points at action {action_id:?}, which does not exist in this plan. \
             Use the id of an action that appears earlier in the plan, or remove the reference."
        ),
        ProtocolError::TemplateError(detail) => format!(
            "A template reference could not be resolved: {detail}. Check that the referenced action, \
             memory key, or trigger field is actually available at this point in the plan."
        ),
    }
}

#[cfg(test)]
#[path = "correction_tests.rs"]
mod tests;
