use super::*;

#[test]
fn action_detects_self_dependency() {
    let action = IMLAction::builder()
        .id("a1")
        .depends_on(vec![ActionId::from("a1")])
        .build();
    assert!(action.depends_on_self());
}

#[test]
fn action_target_node_defaults_to_local() {
    let action = IMLAction::builder().id("a1").build();
    assert_eq!(action.target_node(), "local");
}

#[test]
fn retry_backoff_doubles_each_attempt() {
    let retry = RetryPolicy { max_attempts: 4, backoff_seconds: 1.0 };
    assert_eq!(retry.backoff_for_attempt(1), 1.0);
    assert_eq!(retry.backoff_for_attempt(2), 2.0);
    assert_eq!(retry.backoff_for_attempt(3), 4.0);
}

#[test]
fn plan_finds_action_by_id() {
    let a1 = IMLAction::builder().id("a1").build();
    let plan = IMLPlan::builder().actions(vec![a1]).build();
    assert!(plan.find_action(&ActionId::from("a1")).is_some());
    assert!(plan.find_action(&ActionId::from("missing")).is_none());
}

#[test]
fn plan_round_trips_through_json() {
    let a1 = IMLAction::builder().id("a1").build();
    let plan = IMLPlan::builder().actions(vec![a1]).build();
    let json = serde_json::to_string(&plan).expect("serialize");
    let back: IMLPlan = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.plan_id, plan.plan_id);
    assert_eq!(back.actions.len(), 1);
}

#[test]
fn canonical_wire_example_parses() {
    let json = r#"{
        "protocol_version": "2.0",
        "plan_id": "p1",
        "description": "demo",
        "execution_mode": "parallel",
        "module_requirements": {"filesystem": ">=1.0.0"},
        "actions": [
            {"id":"a1","module":"filesystem","action":"read_file",
             "params":{"path":"/tmp/x"},"depends_on":[],
             "on_error":"HALT","retry":{"max_attempts":3,"backoff_seconds":1}}
        ]
    }"#;
    let plan: IMLPlan = serde_json::from_str(json).expect("parse canonical example");
    assert_eq!(plan.execution_mode, ExecutionMode::Parallel);
    assert_eq!(plan.actions[0].retry.max_attempts, 3);
}
