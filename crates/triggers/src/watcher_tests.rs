use super::*;
use chrono::TimeZone;
use iml_core::trigger::{CompositeOp, FilesystemEventKind, TriggerCondition};
use iml_core::TriggerId;

#[test]
fn cron_schedule_matches_exact_minute_and_hour() {
    let cron = CronSchedule::parse("30 9 * * *").unwrap();
    let matching = chrono::Local.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
    let not_matching = chrono::Local.with_ymd_and_hms(2026, 1, 5, 9, 31, 0).unwrap();

    assert!(cron.matches(&matching));
    assert!(!cron.matches(&not_matching));
}

#[test]
fn cron_schedule_rejects_malformed_expression() {
    assert!(CronSchedule::parse("not a cron").is_err());
    assert!(CronSchedule::parse("* * * *").is_err());
}

#[test]
fn matching_event_kind_maps_wanted_kinds_only() {
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;

    let wanted = vec![FilesystemEventKind::Created, FilesystemEventKind::Deleted];
    assert_eq!(matching_event_kind(&EventKind::Create(CreateKind::File), &wanted), Some("created"));
    assert_eq!(matching_event_kind(&EventKind::Remove(RemoveKind::File), &wanted), Some("deleted"));
    assert_eq!(matching_event_kind(&EventKind::Modify(ModifyKind::Any), &wanted), None);
}

#[tokio::test]
async fn composite_and_requires_every_sub_condition() {
    let past = TriggerCondition::Temporal { interval_seconds: None, run_at: Some(0), schedule: None };
    let future =
        TriggerCondition::Temporal { interval_seconds: None, run_at: Some(4_102_444_800_000), schedule: None };

    assert!(evaluate_composite(CompositeOp::And, std::slice::from_ref(&past)).await.unwrap());
    assert!(!evaluate_composite(CompositeOp::And, &[past.clone(), future.clone()]).await.unwrap());
    assert!(evaluate_composite(CompositeOp::Or, &[past, future]).await.unwrap());
}

#[tokio::test]
async fn process_running_reports_false_for_a_name_that_cannot_exist() {
    let found = process_running("iml-triggers-test-process-that-does-not-exist").await.unwrap();
    assert!(!found);
}

#[tokio::test]
async fn stopping_a_watcher_before_it_ever_fires_is_clean() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let condition = TriggerCondition::Temporal { interval_seconds: Some(60), run_at: None, schedule: None };
    let handle = spawn(TriggerId::new("t1"), condition, tx);

    handle.stop().await;

    assert!(rx.try_recv().is_err());
}
