use super::*;
use iml_core::plan::{IMLAction, IMLPlan};

fn plan_with(actions: Vec<IMLAction>) -> IMLPlan {
    IMLPlan::builder().actions(actions).build()
}

#[test]
fn sequential_mode_emits_one_action_per_wave() {
    let plan = plan_with(vec![
        IMLAction::builder().id("a1").build(),
        IMLAction::builder().id("a2").depends_on(vec!["a1".into()]).build(),
    ]);
    let graph = PlanGraph::build(&plan).unwrap();
    let waves = emit_waves(&graph, ExecutionMode::Sequential).unwrap();

    assert_eq!(waves.len(), 2);
    assert_eq!(waves[0].actions, vec![ActionId::from("a1")]);
    assert_eq!(waves[1].actions, vec![ActionId::from("a2")]);
    assert!(waves[1].is_final);
    assert!(!waves[0].is_final);
}

#[test]
fn parallel_mode_groups_independent_actions_into_one_wave() {
    let plan = plan_with(vec![
        IMLAction::builder().id("a1").build(),
        IMLAction::builder().id("a2").build(),
        IMLAction::builder().id("a3").depends_on(vec!["a1".into(), "a2".into()]).build(),
    ]);
    let graph = PlanGraph::build(&plan).unwrap();
    let waves = emit_waves(&graph, ExecutionMode::Parallel).unwrap();

    assert_eq!(waves.len(), 2);
    assert_eq!(waves[0].actions, vec![ActionId::from("a1"), ActionId::from("a2")]);
    assert_eq!(waves[1].actions, vec![ActionId::from("a3")]);
    assert!(waves[1].is_final);
}

#[test]
fn reactive_mode_behaves_like_parallel() {
    let plan = plan_with(vec![
        IMLAction::builder().id("a1").build(),
        IMLAction::builder().id("a2").build(),
    ]);
    let graph = PlanGraph::build(&plan).unwrap();
    let waves = emit_waves(&graph, ExecutionMode::Reactive).unwrap();

    assert_eq!(waves.len(), 1);
    assert_eq!(waves[0].actions, vec![ActionId::from("a1"), ActionId::from("a2")]);
}

#[test]
fn empty_plan_emits_no_waves() {
    let plan = plan_with(vec![]);
    let graph = PlanGraph::build(&plan).unwrap();
    let waves = emit_waves(&graph, ExecutionMode::Parallel).unwrap();
    assert!(waves.is_empty());
}
