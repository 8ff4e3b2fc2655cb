use super::*;
use iml_core::event::EventRecord;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn literal_pattern_requires_exact_topic() {
    assert!(topic_matches("llmos.plans", "llmos.plans"));
    assert!(!topic_matches("llmos.plans", "llmos.plans.extra"));
}

#[test]
fn single_star_matches_exactly_one_segment() {
    assert!(topic_matches("llmos.filesystem.*", "llmos.filesystem.changed"));
    assert!(!topic_matches("llmos.filesystem.*", "llmos.filesystem.a.b"));
}

#[test]
fn hash_matches_any_depth_including_the_bare_prefix() {
    assert!(topic_matches("llmos.iot.#", "llmos.iot"));
    assert!(topic_matches("llmos.iot.#", "llmos.iot.temp"));
    assert!(topic_matches("llmos.iot.#", "llmos.iot.a.b.c"));
}

#[test]
fn bare_hash_matches_everything() {
    assert!(topic_matches("#", "any.topic.ever"));
}

struct CountingBus(Arc<AtomicUsize>);

#[async_trait]
impl EventBus for CountingBus {
    async fn emit(&self, _record: EventRecord) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn record(topic: &str) -> EventRecord {
    EventRecord::new(topic, "test_event", "test", 0)
}

#[tokio::test]
async fn matching_route_receives_the_event() {
    let counter = Arc::new(AtomicUsize::new(0));
    let router = EventRouter::new(None);
    router.add_route("llmos.filesystem.*", Arc::new(CountingBus(counter.clone())));

    router.emit(record("llmos.filesystem.changed")).await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unmatched_event_falls_through_to_fallback() {
    let matched = Arc::new(AtomicUsize::new(0));
    let fallback = Arc::new(AtomicUsize::new(0));
    let router = EventRouter::new(Some(Arc::new(CountingBus(fallback.clone()))));
    router.add_route("llmos.filesystem.*", Arc::new(CountingBus(matched.clone())));

    router.emit(record("llmos.iot.temp")).await;

    assert_eq!(matched.load(Ordering::SeqCst), 0);
    assert_eq!(fallback.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn matched_event_does_not_also_go_to_fallback() {
    let matched = Arc::new(AtomicUsize::new(0));
    let fallback = Arc::new(AtomicUsize::new(0));
    let router = EventRouter::new(Some(Arc::new(CountingBus(fallback.clone()))));
    router.add_route("llmos.plans", Arc::new(CountingBus(matched.clone())));

    router.emit(record("llmos.plans")).await;

    assert_eq!(matched.load(Ordering::SeqCst), 1);
    assert_eq!(fallback.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_matching_route_is_called() {
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    let router = EventRouter::new(None);
    router.add_route("llmos.plans", Arc::new(CountingBus(a.clone())));
    router.add_route("llmos.#", Arc::new(CountingBus(b.clone())));

    router.emit(record("llmos.plans")).await;

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
}
