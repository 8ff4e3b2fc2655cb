use super::*;

#[test]
fn readonly_profile_denies_env_templates() {
    let profile = PermissionProfile::readonly();
    assert!(!profile.allow_env_templates);
    assert!(!profile.allow_approval_bypass);
}

#[test]
fn unrestricted_profile_allows_bypass() {
    let profile = PermissionProfile::unrestricted();
    assert!(profile.allow_approval_bypass);
    assert_eq!(profile.max_plan_actions, usize::MAX);
}

#[test]
fn local_worker_denies_os_exec_by_default() {
    let profile = PermissionProfile::local_worker();
    assert!(profile.denied_patterns.iter().any(|p| p == "os_exec.*"));
}
