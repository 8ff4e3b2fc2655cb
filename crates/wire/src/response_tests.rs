// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::types::ErrorKind;
use iml_core::{PlanId, PlanStatus};

#[test]
fn ok_round_trips_through_json() {
    let json = serde_json::to_string(&Response::Ok).expect("serialize failed");
    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    assert!(matches!(back, Response::Ok));
}

#[test]
fn error_response_carries_a_typed_kind() {
    let response = Response::Error { kind: ErrorKind::ScannerRejected, message: "blocked".to_string() };
    let json = serde_json::to_string(&response).expect("serialize failed");
    assert!(json.contains("SCANNER_REJECTED"));

    let back: Response = serde_json::from_str(&json).expect("deserialize failed");
    match back {
        Response::Error { kind, message } => {
            assert_eq!(kind, ErrorKind::ScannerRejected);
            assert_eq!(message, "blocked");
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[test]
fn plan_submitted_omits_actions_when_not_present() {
    let response = Response::PlanSubmitted {
        plan_id: PlanId::new("p1"),
        status: PlanStatus::Queued,
        message: "accepted".to_string(),
        actions: None,
    };
    let json = serde_json::to_string(&response).expect("serialize failed");
    assert!(!json.contains("\"actions\""));
}

#[test]
fn tag_field_names_the_variant() {
    let json = serde_json::to_string(&Response::Pong).expect("serialize failed");
    assert_eq!(json, r#"{"type":"Pong"}"#);
}
