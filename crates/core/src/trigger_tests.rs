use super::*;
use crate::plan::IMLPlan;

fn sample_trigger() -> TriggerDefinition {
    TriggerDefinition {
        trigger_id: TriggerId::new("daily-backup"),
        name: "daily backup".to_string(),
        condition: TriggerCondition::Temporal {
            interval_seconds: Some(86400),
            run_at: None,
            schedule: None,
        },
        plan_template: serde_json::from_str::<IMLPlan>(
            r#"{"plan_id":"tpl","actions":[]}"#,
        )
        .expect("plan template"),
        priority: 0,
        state: TriggerState::Active,
        min_interval_seconds: 60,
        max_fires_per_hour: 10,
        conflict_policy: ConflictPolicy::Queue,
        resource_lock: None,
        enabled: true,
        expires_at: None,
        max_chain_depth: 5,
        chain_depth: 0,
        health: TriggerHealth::default(),
        last_fired_at: None,
    }
}

#[test]
fn chain_depth_exceeded_blocks_further_fires() {
    let mut trigger = sample_trigger();
    trigger.chain_depth = 5;
    assert!(trigger.chain_depth_exceeded());
}

#[test]
fn zero_min_interval_allows_consecutive_fires() {
    let mut trigger = sample_trigger();
    trigger.min_interval_seconds = 0;
    trigger.last_fired_at = Some(1000);
    assert!(trigger.interval_elapsed(1000));
}

#[test]
fn interval_not_elapsed_blocks_fire() {
    let mut trigger = sample_trigger();
    trigger.last_fired_at = Some(1000);
    trigger.min_interval_seconds = 60;
    assert!(!trigger.interval_elapsed(1000));
    assert!(trigger.interval_elapsed(1000 + 60_000));
}

#[test]
fn only_fire_ready_states_can_fire() {
    let mut trigger = sample_trigger();
    trigger.state = TriggerState::Inactive;
    assert!(!trigger.can_fire(0));
    trigger.state = TriggerState::Watching;
    trigger.last_fired_at = None;
    assert!(trigger.can_fire(0));
}

#[test]
fn expired_trigger_cannot_fire() {
    let mut trigger = sample_trigger();
    trigger.expires_at = Some(500);
    assert!(trigger.is_expired(500));
    assert!(!trigger.can_fire(500));
}
