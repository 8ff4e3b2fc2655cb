use super::*;
use crate::schema::tests::memory_pool;
use iml_core::plan::IMLPlan;
use iml_core::trigger::{ConflictPolicy, TriggerCondition, TriggerHealth};

fn trigger(id: &str) -> TriggerDefinition {
    TriggerDefinition {
        trigger_id: TriggerId::new(id),
        name: format!("trigger-{id}"),
        condition: TriggerCondition::Temporal {
            interval_seconds: Some(60),
            run_at: None,
            schedule: None,
        },
        plan_template: IMLPlan::builder().build(),
        priority: 0,
        state: TriggerState::Registered,
        min_interval_seconds: 0,
        max_fires_per_hour: 0,
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

#[tokio::test]
async fn create_then_get_round_trips() {
    let store = TriggerStore::from_pool(memory_pool().await);
    store.create(&trigger("t1"), 1_000).await.unwrap();

    let fetched = store.get(&TriggerId::new("t1")).await.unwrap().unwrap();
    assert_eq!(fetched.name, "trigger-t1");
    assert_eq!(fetched.state, TriggerState::Registered);
}

#[tokio::test]
async fn get_on_missing_trigger_returns_none() {
    let store = TriggerStore::from_pool(memory_pool().await);
    assert!(store.get(&TriggerId::new("ghost")).await.unwrap().is_none());
}

#[tokio::test]
async fn update_rejects_missing_trigger() {
    let store = TriggerStore::from_pool(memory_pool().await);
    let err = store.update(&trigger("ghost"), 2_000).await.unwrap_err();
    assert!(matches!(err, StorageError::TriggerNotFound(_)));
}

#[tokio::test]
async fn set_state_persists_the_new_state() {
    let store = TriggerStore::from_pool(memory_pool().await);
    store.create(&trigger("t1"), 1_000).await.unwrap();

    store.set_state(&TriggerId::new("t1"), TriggerState::Active, 2_000).await.unwrap();

    let fetched = store.get(&TriggerId::new("t1")).await.unwrap().unwrap();
    assert_eq!(fetched.state, TriggerState::Active);
}

#[tokio::test]
async fn delete_removes_the_trigger() {
    let store = TriggerStore::from_pool(memory_pool().await);
    store.create(&trigger("t1"), 1_000).await.unwrap();

    store.delete(&TriggerId::new("t1")).await.unwrap();

    assert!(store.get(&TriggerId::new("t1")).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_on_missing_trigger_fails() {
    let store = TriggerStore::from_pool(memory_pool().await);
    let err = store.delete(&TriggerId::new("ghost")).await.unwrap_err();
    assert!(matches!(err, StorageError::TriggerNotFound(_)));
}

#[tokio::test]
async fn list_enabled_excludes_disabled_triggers() {
    let store = TriggerStore::from_pool(memory_pool().await);
    store.create(&trigger("t1"), 1_000).await.unwrap();
    let mut disabled = trigger("t2");
    disabled.enabled = false;
    store.create(&disabled, 1_000).await.unwrap();

    let enabled = store.list_enabled().await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].trigger_id, TriggerId::new("t1"));

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
}
