use super::*;

const CANONICAL_PLAN: &str = r#"{
    "protocol_version": "2.0",
    "plan_id": "pln-001",
    "execution_mode": "sequential",
    "actions": [
        {
            "id": "a1",
            "module": "filesystem",
            "action": "read_file",
            "params": {"path": "/tmp/notes.txt"}
        }
    ]
}"#;

#[test]
fn parses_well_formed_plan_without_repair() {
    let outcome = parse(CANONICAL_PLAN).expect("canonical plan should parse");
    assert!(!outcome.was_repaired);
    assert_eq!(outcome.plan.plan_id.as_str(), "pln-001");
    assert_eq!(outcome.plan.actions.len(), 1);
}

#[test]
fn repairs_fenced_plan_and_marks_repair() {
    let fenced = format!("```json\n{CANONICAL_PLAN}\n```");
    let outcome = parse(&fenced).expect("fenced plan should parse after repair");
    assert!(outcome.was_repaired);
    assert!(outcome.transformations_applied.contains(&"strip_markdown_fence"));
}

#[test]
fn unknown_module_is_not_a_parse_error() {
    let plan = CANONICAL_PLAN.replace("filesystem", "not_a_real_module");
    let outcome = parse(&plan).expect("unknown module should not fail parsing");
    assert_eq!(outcome.plan.actions[0].module.as_str(), "not_a_real_module");
}

#[test]
fn rejects_plan_with_dependency_cycle() {
    let cyclic = r#"{
        "plan_id": "pln-002",
        "actions": [
            {"id": "a1", "module": "filesystem", "action": "read_file", "depends_on": ["a2"]},
            {"id": "a2", "module": "filesystem", "action": "read_file", "depends_on": ["a1"]}
        ]
    }"#;
    let err = parse(cyclic).unwrap_err();
    assert!(matches!(err, ProtocolError::DagCycle(_)));
}

#[test]
fn garbage_input_fails_with_parse_error() {
    let err = parse("not json at all {{{").unwrap_err();
    assert!(matches!(err, ProtocolError::ParseError(_)));
}
