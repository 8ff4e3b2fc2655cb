use super::*;
use iml_core::plan::{IMLAction, IMLPlan};
use serde_json::json;

#[test]
fn accepts_well_formed_linear_plan() {
    let plan = IMLPlan::builder()
        .actions(vec![
            IMLAction::builder().id("a1").build(),
            IMLAction::builder().id("a2").depends_on(vec!["a1".into()]).build(),
        ])
        .build();
    assert!(validate(&plan).is_ok());
}

#[test]
fn rejects_duplicate_action_ids() {
    let plan = IMLPlan::builder()
        .actions(vec![
            IMLAction::builder().id("a1").build(),
            IMLAction::builder().id("a1").build(),
        ])
        .build();
    let err = validate(&plan).unwrap_err();
    assert!(matches!(err, ProtocolError::ValidationError(msg) if msg.contains("duplicate")));
}

#[test]
fn rejects_dependency_on_unknown_action() {
    let plan = IMLPlan::builder()
        .actions(vec![IMLAction::builder().id("a1").depends_on(vec!["ghost".into()]).build()])
        .build();
    let err = validate(&plan).unwrap_err();
    assert!(matches!(err, ProtocolError::ValidationError(msg) if msg.contains("unknown action")));
}

#[test]
fn rejects_self_dependency() {
    let plan = IMLPlan::builder()
        .actions(vec![IMLAction::builder().id("a1").depends_on(vec!["a1".into()]).build()])
        .build();
    let err = validate(&plan).unwrap_err();
    assert!(matches!(err, ProtocolError::ValidationError(msg) if msg.contains("depends on itself")));
}

#[test]
fn detects_dependency_cycle_and_reports_nodes() {
    let plan = IMLPlan::builder()
        .actions(vec![
            IMLAction::builder().id("a1").depends_on(vec!["a2".into()]).build(),
            IMLAction::builder().id("a2").depends_on(vec!["a1".into()]).build(),
        ])
        .build();
    let err = validate(&plan).unwrap_err();
    match err {
        ProtocolError::DagCycle(nodes) => {
            assert_eq!(nodes.len(), 2);
            assert!(nodes.contains(&"a1".to_string()));
            assert!(nodes.contains(&"a2".to_string()));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn rejects_template_reference_to_unknown_action() {
    let mut params = std::collections::HashMap::new();
    params.insert("path".to_string(), json!("{{result.ghost.stdout}}"));
    let plan = IMLPlan::builder()
        .actions(vec![IMLAction::builder().id("a1").params(params).build()])
        .build();
    let err = validate(&plan).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownTemplateReference(id) if id == "ghost"));
}

#[test]
fn accepts_template_reference_to_known_action() {
    let mut params = std::collections::HashMap::new();
    params.insert("path".to_string(), json!("{{result.a1.stdout}}"));
    let plan = IMLPlan::builder()
        .actions(vec![
            IMLAction::builder().id("a1").build(),
            IMLAction::builder().id("a2").depends_on(vec!["a1".into()]).params(params).build(),
        ])
        .build();
    assert!(validate(&plan).is_ok());
}

#[test]
fn detects_rollback_cycle() {
    let mut a1 = IMLAction::builder().id("a1").build();
    let mut a2 = IMLAction::builder().id("a2").build();
    a1.rollback = Some(Box::new(a2.clone()));
    a2.rollback = Some(Box::new(a1.clone()));
    let plan = IMLPlan::builder().actions(vec![a1, a2]).build();
    let err = validate(&plan).unwrap_err();
    assert!(matches!(err, ProtocolError::ValidationError(msg) if msg.contains("rollback cycle")));
}

#[test]
fn reactive_mode_requires_trigger_binding() {
    let plan = IMLPlan::builder()
        .execution_mode(ExecutionMode::Reactive)
        .actions(vec![IMLAction::builder().id("a1").build()])
        .build();
    let err = validate(&plan).unwrap_err();
    assert!(matches!(err, ProtocolError::ValidationError(msg) if msg.contains("REACTIVE")));
}

#[test]
fn reactive_mode_with_trigger_metadata_is_accepted() {
    let mut metadata = std::collections::HashMap::new();
    metadata.insert("trigger_id".to_string(), json!("trg-1"));
    let plan = IMLPlan::builder()
        .execution_mode(ExecutionMode::Reactive)
        .metadata(metadata)
        .actions(vec![IMLAction::builder().id("a1").build()])
        .build();
    assert!(validate(&plan).is_ok());
}
