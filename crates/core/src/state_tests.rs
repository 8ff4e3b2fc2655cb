use super::*;

#[test]
fn new_state_starts_queued_and_non_terminal() {
    let state = ExecutionState::new(PlanId::from("p1"), 1000);
    assert_eq!(state.plan_status, PlanStatus::Queued);
    assert!(!state.plan_status.is_terminal());
}

#[test]
fn action_finalize_is_idempotent() {
    let mut action = ActionState::pending(ActionId::from("a1"));
    action.finalize(ActionStatus::Completed, 100);
    action.finalize(ActionStatus::Failed, 200);
    // second call must not override the first terminal transition
    assert_eq!(action.status, ActionStatus::Completed);
    assert_eq!(action.finished_at, Some(100));
}

#[test]
fn all_actions_terminal_is_true_when_empty() {
    let state = ExecutionState::new(PlanId::from("p1"), 0);
    assert!(state.all_actions_terminal());
}

#[test]
fn all_actions_terminal_false_while_running() {
    let mut state = ExecutionState::new(PlanId::from("p1"), 0);
    let mut action = ActionState::pending(ActionId::from("a1"));
    action.status = ActionStatus::Running;
    state.actions.insert(action.action_id.clone(), action);
    assert!(!state.all_actions_terminal());
}

#[test]
fn terminal_plan_statuses() {
    for status in [
        PlanStatus::Completed,
        PlanStatus::Failed,
        PlanStatus::Cancelled,
        PlanStatus::Rejected,
    ] {
        assert!(status.is_terminal());
    }
    assert!(!PlanStatus::Running.is_terminal());
    assert!(!PlanStatus::Queued.is_terminal());
}
