use super::*;

#[test]
fn wildcard_module_matches_any_action() {
    assert!(glob_matches("filesystem.*", "filesystem.read_file"));
    assert!(!glob_matches("filesystem.*", "os_exec.run"));
}

#[test]
fn double_wildcard_matches_everything() {
    assert!(glob_matches("*.*", "anything.at_all"));
}

#[test]
fn partial_action_wildcard_matches_prefix() {
    assert!(glob_matches("filesystem.read_*", "filesystem.read_file"));
    assert!(!glob_matches("filesystem.read_*", "filesystem.write_file"));
}

#[test]
fn literal_pattern_requires_exact_match() {
    assert!(glob_matches("filesystem.read_file", "filesystem.read_file"));
    assert!(!glob_matches("filesystem.read_file", "filesystem.read_file2"));
}
