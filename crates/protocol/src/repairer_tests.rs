use super::*;

#[test]
fn well_formed_json_is_not_modified() {
    let input = r#"{"a": 1}"#;
    let outcome = repair(input).expect("repair should succeed trivially");
    assert!(!outcome.was_modified);
    assert!(outcome.transformations_applied.is_empty());
}

#[test]
fn strips_markdown_fence() {
    let input = "```json\n{\"a\": 1}\n```";
    let outcome = repair(input).expect("repair fenced json");
    assert!(outcome.was_modified);
    assert_eq!(outcome.parsed["a"], 1);
}

#[test]
fn strips_line_comments() {
    let input = "{\"a\": 1 // trailing comment\n}";
    let outcome = repair(input).expect("repair commented json");
    assert_eq!(outcome.parsed["a"], 1);
}

#[test]
fn replaces_python_literals() {
    let input = "{\"flag\": True, \"other\": None}";
    let outcome = repair(input).expect("repair python literals");
    assert_eq!(outcome.parsed["flag"], true);
    assert!(outcome.parsed["other"].is_null());
}

#[test]
fn quotes_bare_keys() {
    let input = "{a: 1, b: 2}";
    let outcome = repair(input).expect("repair bare keys");
    assert_eq!(outcome.parsed["a"], 1);
    assert_eq!(outcome.parsed["b"], 2);
}

#[test]
fn converts_single_quotes() {
    let input = "{'a': 'hello'}";
    let outcome = repair(input).expect("repair single quotes");
    assert_eq!(outcome.parsed["a"], "hello");
}

#[test]
fn strips_trailing_commas() {
    let input = r#"{"a": [1, 2, 3,],}"#;
    let outcome = repair(input).expect("repair trailing commas");
    assert_eq!(outcome.parsed["a"][2], 3);
}

#[test]
fn closes_unbalanced_brackets() {
    let input = r#"{"a": [1, 2"#;
    let outcome = repair(input).expect("repair unbalanced brackets");
    assert_eq!(outcome.parsed["a"][1], 2);
}

#[test]
fn unrepairable_input_fails_with_parse_error() {
    let input = "not json at all {{{";
    let err = repair(input).expect_err("garbage input should fail");
    assert!(matches!(err, ProtocolError::ParseError(_)));
}
